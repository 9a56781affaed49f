use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use coopsol_billing::ResultadoCalculo;
use coopsol_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, UnidadeId, ValueObject,
};
use coopsol_events::Event;

use crate::status::FaturaStatus;

/// Fatura identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaturaId(pub AggregateId);

impl FaturaId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for FaturaId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference month of a billing period (competência).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MesReferencia {
    mes: u32,
    ano: i32,
}

impl MesReferencia {
    pub fn new(mes: u32, ano: i32) -> DomainResult<Self> {
        if !(1..=12).contains(&mes) {
            return Err(DomainError::validation(format!(
                "reference month out of range: {mes}"
            )));
        }
        Ok(Self { mes, ano })
    }

    pub fn mes(&self) -> u32 {
        self.mes
    }

    pub fn ano(&self) -> i32 {
        self.ano
    }
}

impl ValueObject for MesReferencia {}

impl core::fmt::Display for MesReferencia {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02}/{}", self.mes, self.ano)
    }
}

/// Metadata of the utility-bill file attached to a fatura.
///
/// Only metadata lives here; the file itself is stored by an external
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnexoArquivo {
    pub nome: String,
    pub caminho: String,
    pub tipo: String,
    pub tamanho: u64,
}

impl ValueObject for AnexoArquivo {}

/// Payment confirmation metadata collected by the caller before the `paga`
/// transition.
///
/// `valor_adicional` is recorded as-is; it is not reconciled against
/// `valor_desconto`/`valor_assinatura` (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoPagamento {
    pub data_pagamento: DateTime<Utc>,
    pub valor_adicional: f64,
    pub observacao: Option<String>,
}

impl ValueObject for InfoPagamento {}

/// One entry of the append-only transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransicaoRegistro {
    pub em: DateTime<Utc>,
    pub de: FaturaStatus,
    pub para: FaturaStatus,
    pub nota: Option<String>,
}

impl ValueObject for TransicaoRegistro {}

/// Fatura domain error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FaturaError {
    /// The requested lifecycle transition is not in the allowed-transition
    /// table. No partial state change happens; no history entry is appended.
    #[error("transição de status inválida: {de} -> {para}")]
    TransicaoInvalida {
        de: FaturaStatus,
        para: FaturaStatus,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Aggregate root: Fatura (one member's monthly bill).
#[derive(Debug, Clone, PartialEq)]
pub struct Fatura {
    id: FaturaId,
    unidade_id: Option<UnidadeId>,
    referencia: Option<MesReferencia>,

    // Raw utility-bill inputs, captured at generation time.
    consumo_kwh: f64,
    total_fatura: f64,
    iluminacao_publica: f64,
    outros_valores: f64,
    fatura_concessionaria: f64,
    saldo_creditos_kwh: f64,
    observacao: Option<String>,

    // Derived values; always written together from one calculation result.
    valor_desconto: f64,
    valor_assinatura: f64,
    economia: f64,

    status: FaturaStatus,
    historico: Vec<TransicaoRegistro>,
    anexo: Option<AnexoArquivo>,
    pagamento: Option<InfoPagamento>,

    version: u64,
    created: bool,
}

impl Fatura {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: FaturaId) -> Self {
        Self {
            id,
            unidade_id: None,
            referencia: None,
            consumo_kwh: 0.0,
            total_fatura: 0.0,
            iluminacao_publica: 0.0,
            outros_valores: 0.0,
            fatura_concessionaria: 0.0,
            saldo_creditos_kwh: 0.0,
            observacao: None,
            valor_desconto: 0.0,
            valor_assinatura: 0.0,
            economia: 0.0,
            status: FaturaStatus::Gerada,
            historico: Vec::new(),
            anexo: None,
            pagamento: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> FaturaId {
        self.id
    }

    pub fn unidade_id(&self) -> Option<UnidadeId> {
        self.unidade_id
    }

    pub fn referencia(&self) -> Option<MesReferencia> {
        self.referencia
    }

    pub fn consumo_kwh(&self) -> f64 {
        self.consumo_kwh
    }

    pub fn total_fatura(&self) -> f64 {
        self.total_fatura
    }

    pub fn iluminacao_publica(&self) -> f64 {
        self.iluminacao_publica
    }

    pub fn outros_valores(&self) -> f64 {
        self.outros_valores
    }

    pub fn fatura_concessionaria(&self) -> f64 {
        self.fatura_concessionaria
    }

    pub fn saldo_creditos_kwh(&self) -> f64 {
        self.saldo_creditos_kwh
    }

    pub fn observacao(&self) -> Option<&str> {
        self.observacao.as_deref()
    }

    pub fn valor_desconto(&self) -> f64 {
        self.valor_desconto
    }

    pub fn valor_assinatura(&self) -> f64 {
        self.valor_assinatura
    }

    pub fn economia(&self) -> f64 {
        self.economia
    }

    pub fn status(&self) -> FaturaStatus {
        self.status
    }

    pub fn historico(&self) -> &[TransicaoRegistro] {
        &self.historico
    }

    pub fn anexo(&self) -> Option<&AnexoArquivo> {
        self.anexo.as_ref()
    }

    pub fn pagamento(&self) -> Option<&InfoPagamento> {
        self.pagamento.as_ref()
    }

    /// The raw-input snapshot for a recalculation, combined with the unit's
    /// current discount percentage.
    pub fn dados_cobranca(&self, percentual_desconto: f64) -> coopsol_billing::DadosCobranca {
        coopsol_billing::DadosCobranca::new(
            self.total_fatura,
            self.iluminacao_publica,
            self.outros_valores,
            self.fatura_concessionaria,
            percentual_desconto,
        )
    }

    /// Invariant helper: payment confirmation is only accepted while the
    /// status can still reach `paga`.
    pub fn is_payable(&self) -> bool {
        self.status.can_transition_to(FaturaStatus::Paga)
    }

    /// Deletion is guarded by the surrounding application to faturas that
    /// never left the `gerada` state.
    pub fn can_delete(&self) -> bool {
        self.status == FaturaStatus::Gerada
    }
}

impl AggregateRoot for Fatura {
    type Id = FaturaId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: GerarFatura — one invoice of a generated billing batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GerarFatura {
    pub fatura_id: FaturaId,
    pub unidade_id: UnidadeId,
    pub referencia: MesReferencia,
    pub consumo_kwh: f64,
    pub total_fatura: f64,
    pub iluminacao_publica: f64,
    pub outros_valores: f64,
    pub fatura_concessionaria: f64,
    pub saldo_creditos_kwh: f64,
    pub observacao: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AplicarCalculo — commit one calculation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AplicarCalculo {
    pub fatura_id: FaturaId,
    pub resultado: ResultadoCalculo,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AlterarStatus — one lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterarStatus {
    pub fatura_id: FaturaId,
    pub para: FaturaStatus,
    /// Free-text reason. Required when `para` is `corrigida`.
    pub nota: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RegistrarPagamento — transition to `paga` with the payment
/// metadata the caller collected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrarPagamento {
    pub fatura_id: FaturaId,
    pub pagamento: InfoPagamento,
    pub nota: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AnexarArquivo — record the metadata of an uploaded bill file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnexarArquivo {
    pub fatura_id: FaturaId,
    pub anexo: AnexoArquivo,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FaturaCommand {
    GerarFatura(GerarFatura),
    AplicarCalculo(AplicarCalculo),
    AlterarStatus(AlterarStatus),
    RegistrarPagamento(RegistrarPagamento),
    AnexarArquivo(AnexarArquivo),
}

/// Event: FaturaGerada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaturaGerada {
    pub fatura_id: FaturaId,
    pub unidade_id: UnidadeId,
    pub referencia: MesReferencia,
    pub consumo_kwh: f64,
    pub total_fatura: f64,
    pub iluminacao_publica: f64,
    pub outros_valores: f64,
    pub fatura_concessionaria: f64,
    pub saldo_creditos_kwh: f64,
    pub observacao: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ValoresCalculados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValoresCalculados {
    pub fatura_id: FaturaId,
    pub resultado: ResultadoCalculo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusAlterado — the fact a history entry is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusAlterado {
    pub fatura_id: FaturaId,
    pub de: FaturaStatus,
    pub para: FaturaStatus,
    pub nota: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PagamentoRegistrado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagamentoRegistrado {
    pub fatura_id: FaturaId,
    pub pagamento: InfoPagamento,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AnexoAtualizado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnexoAtualizado {
    pub fatura_id: FaturaId,
    pub anexo: AnexoArquivo,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FaturaEvent {
    FaturaGerada(FaturaGerada),
    ValoresCalculados(ValoresCalculados),
    StatusAlterado(StatusAlterado),
    PagamentoRegistrado(PagamentoRegistrado),
    AnexoAtualizado(AnexoAtualizado),
}

impl Event for FaturaEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FaturaEvent::FaturaGerada(_) => "faturas.fatura.gerada",
            FaturaEvent::ValoresCalculados(_) => "faturas.fatura.valores_calculados",
            FaturaEvent::StatusAlterado(_) => "faturas.fatura.status_alterado",
            FaturaEvent::PagamentoRegistrado(_) => "faturas.fatura.pagamento_registrado",
            FaturaEvent::AnexoAtualizado(_) => "faturas.fatura.anexo_atualizado",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            FaturaEvent::FaturaGerada(e) => e.occurred_at,
            FaturaEvent::ValoresCalculados(e) => e.occurred_at,
            FaturaEvent::StatusAlterado(e) => e.occurred_at,
            FaturaEvent::PagamentoRegistrado(e) => e.occurred_at,
            FaturaEvent::AnexoAtualizado(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Fatura {
    type Command = FaturaCommand;
    type Event = FaturaEvent;
    type Error = FaturaError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            FaturaEvent::FaturaGerada(e) => {
                self.id = e.fatura_id;
                self.unidade_id = Some(e.unidade_id);
                self.referencia = Some(e.referencia);
                self.consumo_kwh = e.consumo_kwh;
                self.total_fatura = e.total_fatura;
                self.iluminacao_publica = e.iluminacao_publica;
                self.outros_valores = e.outros_valores;
                self.fatura_concessionaria = e.fatura_concessionaria;
                self.saldo_creditos_kwh = e.saldo_creditos_kwh;
                self.observacao = e.observacao.clone();
                self.status = FaturaStatus::Gerada;
                self.created = true;
            }
            FaturaEvent::ValoresCalculados(e) => {
                // The three derived fields always move together.
                self.valor_desconto = e.resultado.valor_desconto;
                self.valor_assinatura = e.resultado.valor_assinatura;
                self.economia = e.resultado.economia;
            }
            FaturaEvent::StatusAlterado(e) => {
                self.historico.push(TransicaoRegistro {
                    em: e.occurred_at,
                    de: e.de,
                    para: e.para,
                    nota: e.nota.clone(),
                });
                self.status = e.para;
            }
            FaturaEvent::PagamentoRegistrado(e) => {
                self.pagamento = Some(e.pagamento.clone());
            }
            FaturaEvent::AnexoAtualizado(e) => {
                self.anexo = Some(e.anexo.clone());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            FaturaCommand::GerarFatura(cmd) => self.handle_gerar(cmd),
            FaturaCommand::AplicarCalculo(cmd) => self.handle_aplicar_calculo(cmd),
            FaturaCommand::AlterarStatus(cmd) => self.handle_alterar_status(cmd),
            FaturaCommand::RegistrarPagamento(cmd) => self.handle_registrar_pagamento(cmd),
            FaturaCommand::AnexarArquivo(cmd) => self.handle_anexar(cmd),
        }
    }
}

impl Fatura {
    fn ensure_created(&self) -> Result<(), FaturaError> {
        if !self.created {
            return Err(DomainError::not_found().into());
        }
        Ok(())
    }

    fn ensure_fatura_id(&self, fatura_id: FaturaId) -> Result<(), FaturaError> {
        if self.id != fatura_id {
            return Err(DomainError::invariant("fatura_id mismatch").into());
        }
        Ok(())
    }

    /// Single transition guard shared by every status-changing command.
    fn ensure_transition(&self, para: FaturaStatus) -> Result<(), FaturaError> {
        if !self.status.can_transition_to(para) {
            return Err(FaturaError::TransicaoInvalida {
                de: self.status,
                para,
            });
        }
        Ok(())
    }

    fn handle_gerar(&self, cmd: &GerarFatura) -> Result<Vec<FaturaEvent>, FaturaError> {
        if self.created {
            return Err(DomainError::conflict("fatura already generated").into());
        }

        for (campo, valor) in [
            ("consumo_kwh", cmd.consumo_kwh),
            ("total_fatura", cmd.total_fatura),
            ("iluminacao_publica", cmd.iluminacao_publica),
            ("outros_valores", cmd.outros_valores),
            ("fatura_concessionaria", cmd.fatura_concessionaria),
            ("saldo_creditos_kwh", cmd.saldo_creditos_kwh),
        ] {
            if !valor.is_finite() || valor < 0.0 {
                return Err(DomainError::validation(format!(
                    "{campo} must be a non-negative number"
                ))
                .into());
            }
        }

        Ok(vec![FaturaEvent::FaturaGerada(FaturaGerada {
            fatura_id: cmd.fatura_id,
            unidade_id: cmd.unidade_id,
            referencia: cmd.referencia,
            consumo_kwh: cmd.consumo_kwh,
            total_fatura: cmd.total_fatura,
            iluminacao_publica: cmd.iluminacao_publica,
            outros_valores: cmd.outros_valores,
            fatura_concessionaria: cmd.fatura_concessionaria,
            saldo_creditos_kwh: cmd.saldo_creditos_kwh,
            observacao: cmd.observacao.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_aplicar_calculo(
        &self,
        cmd: &AplicarCalculo,
    ) -> Result<Vec<FaturaEvent>, FaturaError> {
        self.ensure_created()?;
        self.ensure_fatura_id(cmd.fatura_id)?;

        // A settled payment freezes the monetary fields.
        if matches!(self.status, FaturaStatus::Paga | FaturaStatus::Finalizada) {
            return Err(DomainError::invariant(
                "monetary values cannot be recalculated after payment",
            )
            .into());
        }

        Ok(vec![FaturaEvent::ValoresCalculados(ValoresCalculados {
            fatura_id: cmd.fatura_id,
            resultado: cmd.resultado,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_alterar_status(
        &self,
        cmd: &AlterarStatus,
    ) -> Result<Vec<FaturaEvent>, FaturaError> {
        self.ensure_created()?;
        self.ensure_fatura_id(cmd.fatura_id)?;
        self.ensure_transition(cmd.para)?;

        if cmd.para == FaturaStatus::Corrigida
            && cmd.nota.as_deref().map_or(true, |n| n.trim().is_empty())
        {
            return Err(
                DomainError::validation("flagging for correction requires a reason note").into(),
            );
        }

        Ok(vec![FaturaEvent::StatusAlterado(StatusAlterado {
            fatura_id: cmd.fatura_id,
            de: self.status,
            para: cmd.para,
            nota: cmd.nota.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_registrar_pagamento(
        &self,
        cmd: &RegistrarPagamento,
    ) -> Result<Vec<FaturaEvent>, FaturaError> {
        self.ensure_created()?;
        self.ensure_fatura_id(cmd.fatura_id)?;
        self.ensure_transition(FaturaStatus::Paga)?;

        Ok(vec![
            FaturaEvent::PagamentoRegistrado(PagamentoRegistrado {
                fatura_id: cmd.fatura_id,
                pagamento: cmd.pagamento.clone(),
                occurred_at: cmd.occurred_at,
            }),
            FaturaEvent::StatusAlterado(StatusAlterado {
                fatura_id: cmd.fatura_id,
                de: self.status,
                para: FaturaStatus::Paga,
                nota: cmd.nota.clone(),
                occurred_at: cmd.occurred_at,
            }),
        ])
    }

    fn handle_anexar(&self, cmd: &AnexarArquivo) -> Result<Vec<FaturaEvent>, FaturaError> {
        self.ensure_created()?;
        self.ensure_fatura_id(cmd.fatura_id)?;

        if self.status.is_terminal() {
            return Err(DomainError::invariant("a finalized fatura is immutable").into());
        }

        Ok(vec![FaturaEvent::AnexoAtualizado(AnexoAtualizado {
            fatura_id: cmd.fatura_id,
            anexo: cmd.anexo.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
