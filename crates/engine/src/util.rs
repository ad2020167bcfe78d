//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a decimal stored as TEXT.
pub(crate) fn parse_decimal(value: &str, label: &str) -> ResultEngine<Decimal> {
    Decimal::from_str(value)
        .map_err(|_| EngineError::InvalidAmount(format!("invalid stored {label}: {value}")))
}

pub(crate) fn parse_optional_decimal(
    value: Option<&str>,
    label: &str,
) -> ResultEngine<Option<Decimal>> {
    value.map(|v| parse_decimal(v, label)).transpose()
}

/// Canonical TEXT form of a decimal (no trailing zeros).
pub(crate) fn decimal_to_db(value: Decimal) -> String {
    value.normalize().to_string()
}

pub(crate) fn ensure_positive(value: Decimal, label: &str) -> ResultEngine<()> {
    if value <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    Ok(())
}

pub(crate) fn ensure_positive_rate(value: Decimal, label: &str) -> ResultEngine<()> {
    if value <= Decimal::ZERO {
        return Err(EngineError::InvalidRate(format!("{label} must be > 0")));
    }
    Ok(())
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
