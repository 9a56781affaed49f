//! Billing calculation for monthly subscription faturas.
//!
//! The calculator derives `{valor_desconto, valor_assinatura, economia}` from
//! one immutable input snapshot, optionally through a per-unit calculation
//! template, with a deterministic fallback to the cooperative's built-in
//! formulas. Formula and template-lookup failures never escape this crate;
//! they degrade to the defaults so the caller always gets a computed value.

pub mod calculator;
pub mod input;

pub use calculator::{BillingCalculator, ResultadoCalculo};
pub use input::{parse_valor, DadosCobranca};
