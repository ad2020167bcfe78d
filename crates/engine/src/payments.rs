//! Payments from Colombia to Venezuela.
//!
//! Payments are immutable; the outstanding debt is always recomputed from the
//! rows in range.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{decimal_to_db, ensure_positive, parse_decimal, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenezuelaPayment {
    pub id: Uuid,
    /// COP.
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub proof_url: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl VenezuelaPayment {
    pub fn new(
        amount: Decimal,
        payment_date: DateTime<Utc>,
        notes: Option<String>,
        proof_url: Option<String>,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_positive(amount, "payment amount")?;
        Ok(Self {
            id: Uuid::new_v4(),
            amount,
            payment_date,
            notes,
            proof_url,
            created_by,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "venezuela_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub amount: String,
    pub payment_date: DateTimeUtc,
    pub notes: Option<String>,
    pub proof_url: Option<String>,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&VenezuelaPayment> for ActiveModel {
    fn from(payment: &VenezuelaPayment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            amount: ActiveValue::Set(decimal_to_db(payment.amount)),
            payment_date: ActiveValue::Set(payment.payment_date),
            notes: ActiveValue::Set(payment.notes.clone()),
            proof_url: ActiveValue::Set(payment.proof_url.clone()),
            created_by: ActiveValue::Set(payment.created_by.clone()),
            created_at: ActiveValue::Set(payment.created_at),
        }
    }
}

impl TryFrom<Model> for VenezuelaPayment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "payment")?,
            amount: parse_decimal(&model.amount, "payment amount")?,
            payment_date: model.payment_date,
            notes: model.notes,
            proof_url: model.proof_url,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
