//! Read-model projections over fatura events.

pub mod resumo;

pub use resumo::{FaturaResumo, ResumoFaturasProjection, ResumoProjectionError};
