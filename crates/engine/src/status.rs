//! Transaction status state machine.
//!
//! ```text
//! PENDIENTE -> PENDIENTE_COLOMBIA -> PENDIENTE_VENEZUELA -> TASA_COMPRA_ESTABLECIDA -> COMPLETADO
//!      \________________\____________________\_______________________\
//!                        -> RECHAZADO | CANCELADO_VENDEDOR | CANCELADO_ADMINISTRADOR
//! ```
//!
//! This module only decides whether an edge is legal and who may take it.
//! Persisting the change together with its history row happens in
//! `Engine::transition_status`.

use serde::{Deserialize, Serialize};

use crate::{Actor, EngineError, ResultEngine, Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pendiente,
    PendienteColombia,
    PendienteVenezuela,
    TasaCompraEstablecida,
    Completado,
    Rechazado,
    CanceladoVendedor,
    CanceladoAdministrador,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::PendienteColombia => "pendiente_colombia",
            Self::PendienteVenezuela => "pendiente_venezuela",
            Self::TasaCompraEstablecida => "tasa_compra_establecida",
            Self::Completado => "completado",
            Self::Rechazado => "rechazado",
            Self::CanceladoVendedor => "cancelado_vendedor",
            Self::CanceladoAdministrador => "cancelado_administrador",
        }
    }

    /// Terminal statuses never change again; only side-channel flags do.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completado | Self::Rechazado | Self::CanceladoVendedor | Self::CanceladoAdministrador
        )
    }

    /// Next step of the happy path, if any.
    pub fn next_in_pipeline(self) -> Option<Self> {
        match self {
            Self::Pendiente => Some(Self::PendienteColombia),
            Self::PendienteColombia => Some(Self::PendienteVenezuela),
            Self::PendienteVenezuela => Some(Self::TasaCompraEstablecida),
            Self::TasaCompraEstablecida => Some(Self::Completado),
            _ => None,
        }
    }
}

impl core::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pendiente" => Ok(Self::Pendiente),
            "pendiente_colombia" => Ok(Self::PendienteColombia),
            "pendiente_venezuela" => Ok(Self::PendienteVenezuela),
            "tasa_compra_establecida" => Ok(Self::TasaCompraEstablecida),
            "completado" => Ok(Self::Completado),
            "rechazado" => Ok(Self::Rechazado),
            "cancelado_vendedor" => Ok(Self::CanceladoVendedor),
            "cancelado_administrador" => Ok(Self::CanceladoAdministrador),
            other => Err(EngineError::InvalidId(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// Who may take a legal edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Guard {
    Role(Role),
    AnyAdmin,
    Owner,
}

fn edge_guard(current: TransactionStatus, requested: TransactionStatus) -> Option<Guard> {
    if current.is_terminal() {
        return None;
    }
    if current.next_in_pipeline() == Some(requested) {
        let role = match current {
            TransactionStatus::Pendiente | TransactionStatus::PendienteColombia => {
                Role::AdminColombia
            }
            _ => Role::AdminVenezuela,
        };
        return Some(Guard::Role(role));
    }
    match requested {
        TransactionStatus::Rechazado | TransactionStatus::CanceladoAdministrador => {
            Some(Guard::AnyAdmin)
        }
        TransactionStatus::CanceladoVendedor => Some(Guard::Owner),
        _ => None,
    }
}

/// Validates `current -> requested` for `actor` on a transaction owned by
/// `owner_id`.
///
/// Illegal edges fail with [`EngineError::InvalidTransition`] regardless of
/// the actor; legal edges taken by the wrong actor fail with
/// [`EngineError::Forbidden`].
pub fn authorize_transition(
    current: TransactionStatus,
    requested: TransactionStatus,
    actor: &Actor,
    owner_id: &str,
) -> ResultEngine<()> {
    let guard = edge_guard(current, requested)
        .ok_or(EngineError::InvalidTransition { current, requested })?;

    let allowed = match guard {
        Guard::Role(role) => actor.role == role,
        Guard::AnyAdmin => actor.role.is_admin(),
        Guard::Owner => actor.user_id == owner_id,
    };
    if !allowed {
        return Err(EngineError::Forbidden(format!(
            "{} cannot move transaction from {current} to {requested}",
            actor.role
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin_co() -> Actor {
        Actor::new("co", Role::AdminColombia)
    }

    fn admin_ve() -> Actor {
        Actor::new("ve", Role::AdminVenezuela)
    }

    fn vendor() -> Actor {
        Actor::new("vendor-1", Role::Vendedor)
    }

    #[test]
    fn happy_path_requires_the_right_admin() {
        use TransactionStatus::*;

        assert!(authorize_transition(Pendiente, PendienteColombia, &admin_co(), "vendor-1").is_ok());
        assert!(
            authorize_transition(PendienteColombia, PendienteVenezuela, &admin_co(), "vendor-1")
                .is_ok()
        );
        assert!(
            authorize_transition(PendienteVenezuela, TasaCompraEstablecida, &admin_ve(), "vendor-1")
                .is_ok()
        );
        assert!(
            authorize_transition(TasaCompraEstablecida, Completado, &admin_ve(), "vendor-1").is_ok()
        );

        assert!(matches!(
            authorize_transition(PendienteVenezuela, TasaCompraEstablecida, &admin_co(), "vendor-1"),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn skipping_steps_is_invalid() {
        use TransactionStatus::*;

        assert_eq!(
            authorize_transition(Pendiente, Completado, &admin_ve(), "vendor-1"),
            Err(EngineError::InvalidTransition {
                current: Pendiente,
                requested: Completado,
            })
        );
        assert_eq!(
            authorize_transition(PendienteColombia, Pendiente, &admin_co(), "vendor-1"),
            Err(EngineError::InvalidTransition {
                current: PendienteColombia,
                requested: Pendiente,
            })
        );
    }

    #[test]
    fn terminal_states_reject_everything() {
        use TransactionStatus::*;

        for terminal in [Completado, Rechazado, CanceladoVendedor, CanceladoAdministrador] {
            assert!(terminal.is_terminal());
            assert_eq!(
                authorize_transition(terminal, Completado, &admin_ve(), "vendor-1"),
                Err(EngineError::InvalidTransition {
                    current: terminal,
                    requested: Completado,
                })
            );
        }
    }

    #[test]
    fn escapes_are_open_from_any_non_terminal_state() {
        use TransactionStatus::*;

        for current in [Pendiente, PendienteColombia, PendienteVenezuela, TasaCompraEstablecida] {
            assert!(authorize_transition(current, Rechazado, &admin_ve(), "vendor-1").is_ok());
            assert!(
                authorize_transition(current, CanceladoAdministrador, &admin_co(), "vendor-1")
                    .is_ok()
            );
            assert!(authorize_transition(current, CanceladoVendedor, &vendor(), "vendor-1").is_ok());
        }
    }

    #[test]
    fn only_the_owner_cancels_as_vendor() {
        use TransactionStatus::*;

        let other = Actor::new("vendor-2", Role::Vendedor);
        assert!(matches!(
            authorize_transition(Pendiente, CanceladoVendedor, &other, "vendor-1"),
            Err(EngineError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_transition(Pendiente, Rechazado, &vendor(), "vendor-1"),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn status_strings_roundtrip() {
        use TransactionStatus::*;

        for status in [
            Pendiente,
            PendienteColombia,
            PendienteVenezuela,
            TasaCompraEstablecida,
            Completado,
            Rechazado,
            CanceladoVendedor,
            CanceladoAdministrador,
        ] {
            assert_eq!(TransactionStatus::try_from(status.as_str()).unwrap(), status);
        }
    }
}
