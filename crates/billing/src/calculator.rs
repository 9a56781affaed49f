use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use coopsol_core::{UnidadeId, ValueObject};
use coopsol_formula::{evaluate, VariableMap};
use coopsol_templates::{TemplateDirectory, TemplateResolver};

use crate::input::DadosCobranca;

/// Outcome of one billing calculation.
///
/// The two monetary fields are always mutually consistent: the subscription
/// is computed from the discount value that was actually settled, whether it
/// came from a template formula or from the built-in default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultadoCalculo {
    pub valor_desconto: f64,
    pub valor_assinatura: f64,
    /// Accumulated savings for the period; always equals `valor_desconto`.
    pub economia: f64,
    /// True when the built-in default formula produced `valor_desconto`.
    pub desconto_padrao: bool,
    /// True when the built-in default formula produced `valor_assinatura`.
    pub assinatura_padrao: bool,
}

impl ValueObject for ResultadoCalculo {}

impl ResultadoCalculo {
    /// Whether any field fell back to a built-in formula. The calling layer
    /// uses this for its non-blocking "default calculation used" notice.
    pub fn usou_formula_padrao(&self) -> bool {
        self.desconto_padrao || self.assinatura_padrao
    }
}

/// Derives discount and subscription values from one input snapshot.
///
/// Template resolution happens per call (an edited template applies to the
/// next calculation without restart) and the discount always settles before
/// the subscription, whose formula may reference it.
#[derive(Debug)]
pub struct BillingCalculator<D> {
    resolver: TemplateResolver<D>,
}

impl<D> BillingCalculator<D>
where
    D: TemplateDirectory,
{
    pub fn new(directory: D) -> Self {
        Self {
            resolver: TemplateResolver::new(directory),
        }
    }

    /// Compute `{valor_desconto, valor_assinatura, economia}` for one fatura.
    ///
    /// Never fails: formula errors degrade per field to the built-in default
    /// formula, and template lookup failures were already absorbed by the
    /// resolver.
    pub fn calculate(&self, dados: &DadosCobranca, unidade: UnidadeId) -> ResultadoCalculo {
        let template = self.resolver.resolve(unidade);

        let mut vars: VariableMap = HashMap::from([
            ("total_fatura".to_string(), dados.total_fatura),
            ("iluminacao_publica".to_string(), dados.iluminacao_publica),
            ("outros_valores".to_string(), dados.outros_valores),
            ("fatura_concessionaria".to_string(), dados.fatura_concessionaria),
            ("percentual_desconto".to_string(), dados.percentual_desconto),
        ]);

        let (valor_desconto, desconto_padrao) = match &template {
            Some(template) => try_formula(&template.formula_valor_desconto, &vars, "valor_desconto")
                .map(|valor| (valor, false))
                .unwrap_or_else(|| (default_desconto(dados), true)),
            None => (default_desconto(dados), true),
        };

        // The subscription formula sees the discount that actually settled.
        vars.insert("valor_desconto".to_string(), valor_desconto);

        let (valor_assinatura, assinatura_padrao) = match &template {
            Some(template) => {
                try_formula(&template.formula_valor_assinatura, &vars, "valor_assinatura")
                    .map(|valor| (valor, false))
                    .unwrap_or_else(|| (default_assinatura(dados, valor_desconto), true))
            }
            None => (default_assinatura(dados, valor_desconto), true),
        };

        ResultadoCalculo {
            valor_desconto,
            valor_assinatura,
            economia: valor_desconto,
            desconto_padrao,
            assinatura_padrao,
        }
    }
}

fn try_formula(formula: &str, vars: &VariableMap, campo: &str) -> Option<f64> {
    match evaluate(formula, vars) {
        Ok(valor) => Some(valor),
        Err(error) => {
            warn!(%error, campo, "template formula failed; using built-in default");
            None
        }
    }
}

/// Built-in default discount: the energy portion of the bill times the unit's
/// percentage.
fn default_desconto(dados: &DadosCobranca) -> f64 {
    (dados.total_fatura - dados.iluminacao_publica - dados.outros_valores)
        * (dados.percentual_desconto / 100.0)
}

/// Built-in default subscription: what remains for the cooperative after the
/// discount and the utility company's own portion.
fn default_assinatura(dados: &DadosCobranca, valor_desconto: f64) -> f64 {
    dados.total_fatura - valor_desconto - dados.fatura_concessionaria
}
