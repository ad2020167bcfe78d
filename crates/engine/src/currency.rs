use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// ISO-like currency code for the money values handled by the engine.
///
/// Remittances are collected in Colombian pesos (or US dollars for the
/// PayPal/Zelle/cash-dollar products) and paid out in Venezuelan bolívars.
///
/// ## Minor units
///
/// Amounts are stored as `Decimal`s rounded to `minor_units()` fraction
/// digits once they are frozen on a record (e.g. `amount_bs` at creation).
/// Intermediate settlement arithmetic keeps full precision.
///
/// Example: VES has 2 minor units, so `500000 / 213.5` is frozen as `2341.92`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cop,
    Ves,
    Usd,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Cop => "COP",
            Currency::Ves => "VES",
            Currency::Usd => "USD",
        }
    }

    /// Number of fraction digits used when freezing/formatting amounts.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Currency::Cop | Currency::Ves | Currency::Usd => 2,
        }
    }

    /// Rounds `amount` to the currency minor units (half away from zero).
    #[must_use]
    pub fn round(self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.minor_units(), RoundingStrategy::MidpointAwayFromZero)
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "COP" => Ok(Currency::Cop),
            "VES" | "BS" => Ok(Currency::Ves),
            "USD" => Ok(Currency::Usd),
            other => Err(EngineError::InvalidAmount(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
