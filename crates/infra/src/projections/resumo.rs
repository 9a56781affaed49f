use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use coopsol_core::UnidadeId;
use coopsol_events::Event;
use coopsol_faturas::{FaturaEvent, FaturaId, FaturaStatus, MesReferencia};

/// Queryable fatura read model: the field set the persistence collaborator
/// stores per record.
#[derive(Debug, Clone, PartialEq)]
pub struct FaturaResumo {
    pub fatura_id: FaturaId,
    pub unidade_id: UnidadeId,
    pub referencia: MesReferencia,
    pub status: FaturaStatus,
    pub valor_desconto: f64,
    pub valor_assinatura: f64,
    pub economia: f64,
    pub tem_anexo: bool,
    pub paga_em: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum ResumoProjectionError {
    #[error("event for unknown fatura: {0}")]
    UnknownFatura(FaturaId),
}

/// In-memory projection folding fatura events into summaries.
#[derive(Debug, Default)]
pub struct ResumoFaturasProjection {
    rows: RwLock<HashMap<FaturaId, FaturaResumo>>,
}

impl ResumoFaturasProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the read model.
    pub fn project(&self, event: &FaturaEvent) -> Result<(), ResumoProjectionError> {
        debug!(tipo = event.event_type(), "projecting fatura event");
        let mut rows = self.rows.write().unwrap_or_else(|e| e.into_inner());

        match event {
            FaturaEvent::FaturaGerada(e) => {
                rows.insert(
                    e.fatura_id,
                    FaturaResumo {
                        fatura_id: e.fatura_id,
                        unidade_id: e.unidade_id,
                        referencia: e.referencia,
                        status: FaturaStatus::Gerada,
                        valor_desconto: 0.0,
                        valor_assinatura: 0.0,
                        economia: 0.0,
                        tem_anexo: false,
                        paga_em: None,
                    },
                );
            }
            FaturaEvent::ValoresCalculados(e) => {
                let row = rows
                    .get_mut(&e.fatura_id)
                    .ok_or(ResumoProjectionError::UnknownFatura(e.fatura_id))?;
                row.valor_desconto = e.resultado.valor_desconto;
                row.valor_assinatura = e.resultado.valor_assinatura;
                row.economia = e.resultado.economia;
            }
            FaturaEvent::StatusAlterado(e) => {
                let row = rows
                    .get_mut(&e.fatura_id)
                    .ok_or(ResumoProjectionError::UnknownFatura(e.fatura_id))?;
                row.status = e.para;
            }
            FaturaEvent::PagamentoRegistrado(e) => {
                let row = rows
                    .get_mut(&e.fatura_id)
                    .ok_or(ResumoProjectionError::UnknownFatura(e.fatura_id))?;
                row.paga_em = Some(e.pagamento.data_pagamento);
            }
            FaturaEvent::AnexoAtualizado(e) => {
                let row = rows
                    .get_mut(&e.fatura_id)
                    .ok_or(ResumoProjectionError::UnknownFatura(e.fatura_id))?;
                row.tem_anexo = true;
            }
        }

        Ok(())
    }

    pub fn get(&self, fatura_id: FaturaId) -> Option<FaturaResumo> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.get(&fatura_id).cloned()
    }

    /// Summaries in a given lifecycle status (e.g. everything still payable).
    pub fn by_status(&self, status: FaturaStatus) -> Vec<FaturaResumo> {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.values().filter(|r| r.status == status).cloned().collect()
    }

    pub fn len(&self) -> usize {
        let rows = self.rows.read().unwrap_or_else(|e| e.into_inner());
        rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coopsol_core::AggregateId;
    use coopsol_faturas::{FaturaGerada, InfoPagamento, PagamentoRegistrado, StatusAlterado};

    fn gerada(fatura_id: FaturaId) -> FaturaEvent {
        FaturaEvent::FaturaGerada(FaturaGerada {
            fatura_id,
            unidade_id: UnidadeId::new(),
            referencia: MesReferencia::new(5, 2024).unwrap(),
            consumo_kwh: 300.0,
            total_fatura: 800.0,
            iluminacao_publica: 40.0,
            outros_valores: 0.0,
            fatura_concessionaria: 250.0,
            saldo_creditos_kwh: 0.0,
            observacao: None,
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn folds_the_lifecycle_into_one_row() {
        let projection = ResumoFaturasProjection::new();
        let fatura_id = FaturaId::new(AggregateId::new());

        projection.project(&gerada(fatura_id)).unwrap();
        projection
            .project(&FaturaEvent::StatusAlterado(StatusAlterado {
                fatura_id,
                de: FaturaStatus::Gerada,
                para: FaturaStatus::Pendente,
                nota: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();

        let row = projection.get(fatura_id).unwrap();
        assert_eq!(row.status, FaturaStatus::Pendente);
        assert!(!row.tem_anexo);
        assert_eq!(projection.by_status(FaturaStatus::Pendente).len(), 1);
        assert_eq!(projection.by_status(FaturaStatus::Paga).len(), 0);
    }

    #[test]
    fn payment_event_records_the_payment_date() {
        let projection = ResumoFaturasProjection::new();
        let fatura_id = FaturaId::new(AggregateId::new());
        let quando = Utc::now();

        projection.project(&gerada(fatura_id)).unwrap();
        projection
            .project(&FaturaEvent::PagamentoRegistrado(PagamentoRegistrado {
                fatura_id,
                pagamento: InfoPagamento {
                    data_pagamento: quando,
                    valor_adicional: 0.0,
                    observacao: None,
                },
                occurred_at: quando,
            }))
            .unwrap();

        assert_eq!(projection.get(fatura_id).unwrap().paga_em, Some(quando));
    }

    #[test]
    fn event_for_unknown_fatura_is_an_error() {
        let projection = ResumoFaturasProjection::new();
        let err = projection
            .project(&FaturaEvent::StatusAlterado(StatusAlterado {
                fatura_id: FaturaId::new(AggregateId::new()),
                de: FaturaStatus::Gerada,
                para: FaturaStatus::Pendente,
                nota: None,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, ResumoProjectionError::UnknownFatura(_)));
    }
}
