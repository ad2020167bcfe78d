//! The module contains the error the engine can throw.
//!
//! The settlement errors are:
//!
//! - [`InvalidTransition`] thrown when a status change is not a legal edge.
//! - [`InvalidRate`] thrown when a rate is not strictly positive.
//! - [`NoRateAvailable`] thrown when a rate kind has no quote yet.
//! - [`PurchaseRateNotApplicable`] thrown when touching the purchase rate of a
//!   transaction that is not a completed NORMAL transfer.
//! - [`NoRateToFinalize`] thrown when finalizing a purchase rate that was never set.
//! - [`NegativeBalance`] thrown when an account entry would drive the balance
//!   below zero.
//!
//!  [`InvalidTransition`]: EngineError::InvalidTransition
//!  [`InvalidRate`]: EngineError::InvalidRate
//!  [`NoRateAvailable`]: EngineError::NoRateAvailable
//!  [`PurchaseRateNotApplicable`]: EngineError::PurchaseRateNotApplicable
//!  [`NoRateToFinalize`]: EngineError::NoRateToFinalize
//!  [`NegativeBalance`]: EngineError::NegativeBalance
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::{RateKind, TransactionStatus};

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid transition: {current} -> {requested}")]
    InvalidTransition {
        current: TransactionStatus,
        requested: TransactionStatus,
    },
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
    #[error("No rate available for {0}")]
    NoRateAvailable(RateKind),
    #[error("Purchase rate not applicable to transaction {id} in status {status}")]
    PurchaseRateNotApplicable {
        id: Uuid,
        status: TransactionStatus,
    },
    #[error("No purchase rate to finalize on transaction {0}")]
    NoRateToFinalize(Uuid),
    #[error("Negative balance: {0}")]
    NegativeBalance(String),
    #[error("Commission not applicable: {0}")]
    CommissionNotApplicable(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::InvalidTransition {
                    current: a,
                    requested: b,
                },
                Self::InvalidTransition {
                    current: c,
                    requested: d,
                },
            ) => a == c && b == d,
            (Self::InvalidRate(a), Self::InvalidRate(b)) => a == b,
            (Self::NoRateAvailable(a), Self::NoRateAvailable(b)) => a == b,
            (
                Self::PurchaseRateNotApplicable { id: a, status: b },
                Self::PurchaseRateNotApplicable { id: c, status: d },
            ) => a == c && b == d,
            (Self::NoRateToFinalize(a), Self::NoRateToFinalize(b)) => a == b,
            (Self::NegativeBalance(a), Self::NegativeBalance(b)) => a == b,
            (Self::CommissionNotApplicable(a), Self::CommissionNotApplicable(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
