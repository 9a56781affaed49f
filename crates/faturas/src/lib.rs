//! Fatura lifecycle domain module.
//!
//! This crate contains the business rules for monthly subscription invoices
//! (faturas): the status state machine with its single authoritative
//! transition table, the append-only transition history, and the aggregate
//! commands/events that mutate monetary values and lifecycle state. It is
//! pure deterministic domain logic — no IO, no HTTP, no storage.

pub mod fatura;
pub mod status;

pub use fatura::{
    AlterarStatus, AnexarArquivo, AnexoArquivo, AnexoAtualizado, AplicarCalculo, Fatura,
    FaturaCommand, FaturaError, FaturaEvent, FaturaGerada, FaturaId, GerarFatura,
    InfoPagamento, MesReferencia, PagamentoRegistrado, RegistrarPagamento, StatusAlterado,
    TransicaoRegistro, ValoresCalculados,
};
pub use status::FaturaStatus;
