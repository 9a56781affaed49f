use serde::{Deserialize, Serialize};

/// Fatura lifecycle status.
///
/// `gerada` is the initial state and `finalizada` the terminal one.
/// `atrasada` is reached from `enviada` or `reenviada` when the external
/// due-date check fires; `paga` from `enviada`, `reenviada` or `atrasada`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaturaStatus {
    Gerada,
    Pendente,
    Enviada,
    Corrigida,
    Reenviada,
    Atrasada,
    Paga,
    Finalizada,
}

impl FaturaStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [FaturaStatus; 8] = [
        FaturaStatus::Gerada,
        FaturaStatus::Pendente,
        FaturaStatus::Enviada,
        FaturaStatus::Corrigida,
        FaturaStatus::Reenviada,
        FaturaStatus::Atrasada,
        FaturaStatus::Paga,
        FaturaStatus::Finalizada,
    ];

    /// The single authoritative allowed-transition table.
    ///
    /// Every layer (domain commands, UI action menus) answers "what is
    /// allowed next" through this one function, so they cannot diverge.
    pub fn allowed_targets(self) -> &'static [FaturaStatus] {
        use FaturaStatus::*;
        match self {
            Gerada => &[Pendente],
            Pendente => &[Enviada],
            Enviada => &[Corrigida, Atrasada, Paga],
            Corrigida => &[Reenviada],
            Reenviada => &[Atrasada, Paga],
            Atrasada => &[Paga],
            Paga => &[Finalizada],
            Finalizada => &[],
        }
    }

    pub fn can_transition_to(self, target: FaturaStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Terminal status: nothing transitions out of it.
    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// Lifecycle name as stored by the surrounding application.
    pub fn as_str(self) -> &'static str {
        match self {
            FaturaStatus::Gerada => "gerada",
            FaturaStatus::Pendente => "pendente",
            FaturaStatus::Enviada => "enviada",
            FaturaStatus::Corrigida => "corrigida",
            FaturaStatus::Reenviada => "reenviada",
            FaturaStatus::Atrasada => "atrasada",
            FaturaStatus::Paga => "paga",
            FaturaStatus::Finalizada => "finalizada",
        }
    }
}

impl core::fmt::Display for FaturaStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finalizada_is_terminal() {
        for status in FaturaStatus::ALL {
            assert_eq!(status.is_terminal(), status == FaturaStatus::Finalizada);
        }
    }

    #[test]
    fn paga_is_reachable_from_exactly_three_statuses() {
        let sources: Vec<_> = FaturaStatus::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(FaturaStatus::Paga))
            .collect();
        assert_eq!(
            sources,
            vec![
                FaturaStatus::Enviada,
                FaturaStatus::Reenviada,
                FaturaStatus::Atrasada,
            ]
        );
    }

    #[test]
    fn no_status_skips_ahead_from_gerada() {
        assert_eq!(
            FaturaStatus::Gerada.allowed_targets(),
            &[FaturaStatus::Pendente]
        );
        assert!(!FaturaStatus::Gerada.can_transition_to(FaturaStatus::Enviada));
    }

    #[test]
    fn serializes_as_the_stored_lifecycle_names() {
        for status in FaturaStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
