//! Exchange-rate quotes.
//!
//! A [`RateQuote`] is an immutable row in an append-only time series keyed by
//! [`RateKind`]. The "current" quote of a kind is the most recent one, with
//! the stored insertion `sequence` breaking `created_at` ties; corrections
//! are new rows, never updates.
//!
//! The conversion helpers at the bottom are the only place where the per-kind
//! formulas live.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{decimal_to_db, ensure_positive_rate, parse_decimal, parse_optional_decimal, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    /// COP → Bs rate used by normal transfers.
    Actual,
    Paypal,
    Zelle,
    Dolares,
    /// Official USD → Bs rate.
    BancoCentral,
}

impl RateKind {
    pub const ALL: [RateKind; 5] = [
        RateKind::Actual,
        RateKind::Paypal,
        RateKind::Zelle,
        RateKind::Dolares,
        RateKind::BancoCentral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Actual => "actual",
            Self::Paypal => "paypal",
            Self::Zelle => "zelle",
            Self::Dolares => "dolares",
            Self::BancoCentral => "banco_central",
        }
    }
}

impl core::fmt::Display for RateKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RateKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "actual" => Ok(Self::Actual),
            "paypal" => Ok(Self::Paypal),
            "zelle" => Ok(Self::Zelle),
            "dolares" => Ok(Self::Dolares),
            "banco_central" => Ok(Self::BancoCentral),
            other => Err(EngineError::InvalidRate(format!("invalid rate kind: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub id: Uuid,
    pub kind: RateKind,
    pub sale_rate: Decimal,
    pub purchase_rate: Option<Decimal>,
    pub purchase_rate_final: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl RateQuote {
    pub fn new(
        kind: RateKind,
        sale_rate: Decimal,
        purchase_rate: Option<Decimal>,
        purchase_rate_final: bool,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive_rate(sale_rate, "sale_rate")?;
        if let Some(rate) = purchase_rate {
            ensure_positive_rate(rate, "purchase_rate")?;
        }
        if purchase_rate_final && purchase_rate.is_none() {
            return Err(EngineError::InvalidRate(
                "purchase_rate_final requires a purchase_rate".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            sale_rate,
            purchase_rate,
            purchase_rate_final,
            created_by,
            created_at,
        })
    }
}

/// Current quote per kind. A missing kind does not hide the others.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentRates {
    pub actual: Option<RateQuote>,
    pub paypal: Option<RateQuote>,
    pub zelle: Option<RateQuote>,
    pub dolares: Option<RateQuote>,
    pub banco_central: Option<RateQuote>,
}

impl CurrentRates {
    pub fn get(&self, kind: RateKind) -> Option<&RateQuote> {
        match kind {
            RateKind::Actual => self.actual.as_ref(),
            RateKind::Paypal => self.paypal.as_ref(),
            RateKind::Zelle => self.zelle.as_ref(),
            RateKind::Dolares => self.dolares.as_ref(),
            RateKind::BancoCentral => self.banco_central.as_ref(),
        }
    }

    pub(crate) fn set(&mut self, quote: RateQuote) {
        let slot = match quote.kind {
            RateKind::Actual => &mut self.actual,
            RateKind::Paypal => &mut self.paypal,
            RateKind::Zelle => &mut self.zelle,
            RateKind::Dolares => &mut self.dolares,
            RateKind::BancoCentral => &mut self.banco_central,
        };
        *slot = Some(quote);
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exchange_rates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub rate_kind: String,
    pub sale_rate: String,
    pub purchase_rate: Option<String>,
    pub purchase_rate_final: bool,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    /// Global insertion order, assigned by the engine on insert.
    pub sequence: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RateQuote> for ActiveModel {
    fn from(quote: &RateQuote) -> Self {
        Self {
            id: ActiveValue::Set(quote.id.to_string()),
            rate_kind: ActiveValue::Set(quote.kind.as_str().to_string()),
            sale_rate: ActiveValue::Set(decimal_to_db(quote.sale_rate)),
            purchase_rate: ActiveValue::Set(quote.purchase_rate.map(decimal_to_db)),
            purchase_rate_final: ActiveValue::Set(quote.purchase_rate_final),
            created_by: ActiveValue::Set(quote.created_by.clone()),
            created_at: ActiveValue::Set(quote.created_at),
            sequence: ActiveValue::NotSet,
        }
    }
}

impl TryFrom<Model> for RateQuote {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "rate")?,
            kind: RateKind::try_from(model.rate_kind.as_str())?,
            sale_rate: parse_decimal(&model.sale_rate, "sale_rate")?,
            purchase_rate: parse_optional_decimal(model.purchase_rate.as_deref(), "purchase_rate")?,
            purchase_rate_final: model.purchase_rate_final,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

/// COP → Bs using the `actual` sale rate (COP per Bs).
pub fn cop_to_bs(amount_cop: Decimal, actual_rate: Decimal) -> ResultEngine<Decimal> {
    ensure_positive_rate(actual_rate, "actual rate")?;
    Ok(amount_cop / actual_rate)
}

/// Bs → COP using the `actual` sale rate.
pub fn bs_to_cop(amount_bs: Decimal, actual_rate: Decimal) -> Decimal {
    amount_bs * actual_rate
}

/// USD → Bs using a per-dollar rate (`paypal`, `zelle` or `banco_central`).
pub fn usd_to_bs(amount_usd: Decimal, usd_rate: Decimal) -> Decimal {
    amount_usd * usd_rate
}

/// USD → COP: `usd × banco_central × actual`.
pub fn usd_to_cop(amount_usd: Decimal, banco_central_rate: Decimal, actual_rate: Decimal) -> Decimal {
    amount_usd * banco_central_rate * actual_rate
}

/// COP → USD: `cop / (banco_central × actual)`.
pub fn cop_to_usd(
    amount_cop: Decimal,
    banco_central_rate: Decimal,
    actual_rate: Decimal,
) -> ResultEngine<Decimal> {
    ensure_positive_rate(banco_central_rate, "banco_central rate")?;
    ensure_positive_rate(actual_rate, "actual rate")?;
    Ok(amount_cop / (banco_central_rate * actual_rate))
}
