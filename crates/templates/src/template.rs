use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use coopsol_core::{AggregateId, UnidadeId, ValueObject};

/// Calculation template identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub AggregateId);

impl TemplateId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A named pair of formula strings: one producing the discount amount, one
/// producing the subscription amount.
///
/// Formulas are expressed over the fixed variable vocabulary (`total_fatura`,
/// `iluminacao_publica`, `outros_valores`, `fatura_concessionaria`,
/// `percentual_desconto`, and `valor_desconto` for the subscription formula).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCalculo {
    pub nome: String,
    pub formula_valor_desconto: String,
    pub formula_valor_assinatura: String,
}

impl ValueObject for TemplateCalculo {}

/// Template lookup collaborator failure.
///
/// Absorbed by the resolver as "no template at this step"; never propagated
/// into a billing calculation.
#[derive(Debug, Error)]
pub enum TemplateLookupError {
    #[error("template lookup unavailable: {0}")]
    Unavailable(String),
}

/// Read-only template lookup collaborator.
///
/// The concrete implementation (remote store, cache, fixture) belongs to the
/// surrounding application; the core only issues one lookup per resolution
/// step and never caches beyond a single calculation call.
pub trait TemplateDirectory: Send + Sync {
    /// The template id explicitly assigned to a beneficiary unit, if any.
    fn unit_template_id(
        &self,
        unidade: UnidadeId,
    ) -> Result<Option<TemplateId>, TemplateLookupError>;

    /// The system-wide default template id, if one is configured.
    fn default_template_id(&self) -> Result<Option<TemplateId>, TemplateLookupError>;

    /// The template body for an id, if the id still resolves.
    fn template(&self, id: TemplateId) -> Result<Option<TemplateCalculo>, TemplateLookupError>;
}

impl<D> TemplateDirectory for Arc<D>
where
    D: TemplateDirectory + ?Sized,
{
    fn unit_template_id(
        &self,
        unidade: UnidadeId,
    ) -> Result<Option<TemplateId>, TemplateLookupError> {
        (**self).unit_template_id(unidade)
    }

    fn default_template_id(&self) -> Result<Option<TemplateId>, TemplateLookupError> {
        (**self).default_template_id()
    }

    fn template(&self, id: TemplateId) -> Result<Option<TemplateCalculo>, TemplateLookupError> {
        (**self).template(id)
    }
}
