use serde::{Deserialize, Serialize};

use coopsol_core::ValueObject;

/// Parse a pt-BR formatted monetary string (`"1.234,56"`) into a number.
///
/// Strips every character except digits and the decimal comma (which drops
/// `.` thousands separators and currency symbols along the way), then turns
/// the comma into a dot. An empty or unparsable string is zero; billing
/// inputs parse defensively rather than raising.
pub fn parse_valor(texto: &str) -> f64 {
    let cleaned: String = texto
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    cleaned.parse().unwrap_or(0.0)
}

/// One calculation's input snapshot: the raw utility-bill figures plus the
/// unit's discount percentage.
///
/// Discount and subscription are always derived together from the same
/// snapshot, never independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DadosCobranca {
    pub total_fatura: f64,
    pub iluminacao_publica: f64,
    pub outros_valores: f64,
    pub fatura_concessionaria: f64,
    /// Percentage in the 0–100 range, as configured on the beneficiary unit.
    pub percentual_desconto: f64,
}

impl DadosCobranca {
    pub fn new(
        total_fatura: f64,
        iluminacao_publica: f64,
        outros_valores: f64,
        fatura_concessionaria: f64,
        percentual_desconto: f64,
    ) -> Self {
        Self {
            total_fatura,
            iluminacao_publica,
            outros_valores,
            fatura_concessionaria,
            percentual_desconto,
        }
    }

    /// Build a snapshot from locale-formatted strings as they arrive from
    /// utility-bill forms.
    pub fn from_texto(
        total_fatura: &str,
        iluminacao_publica: &str,
        outros_valores: &str,
        fatura_concessionaria: &str,
        percentual_desconto: &str,
    ) -> Self {
        Self {
            total_fatura: parse_valor(total_fatura),
            iluminacao_publica: parse_valor(iluminacao_publica),
            outros_valores: parse_valor(outros_valores),
            fatura_concessionaria: parse_valor(fatura_concessionaria),
            percentual_desconto: parse_valor(percentual_desconto),
        }
    }
}

impl ValueObject for DadosCobranca {}
