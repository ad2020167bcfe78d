//! Bolívar bank accounts and their entry ledger.
//!
//! Every balance change is an [`AccountEntry`] with a per-account `sequence`
//! and the running `balance_after`. The account's stored balance is the
//! `balance_after` of its latest entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{decimal_to_db, parse_decimal, parse_optional_decimal, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Bs.
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            balance: Decimal::ZERO,
            created_at,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }

    /// Applies `amount` (a magnitude) to `balance`.
    pub fn apply(self, balance: Decimal, amount: Decimal) -> Decimal {
        match self {
            Self::Deposit => balance + amount,
            Self::Withdrawal => balance - amount,
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            other => Err(EngineError::InvalidId(format!("invalid entry kind: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub sequence: i64,
    pub kind: EntryKind,
    /// Non-negative magnitude.
    pub amount: Decimal,
    /// Amount before the bank commission, for linked withdrawals.
    pub gross_amount: Option<Decimal>,
    pub balance_after: Decimal,
    pub description: Option<String>,
    pub linked_transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Net amount left after the bank keeps `pct` percent of `gross`.
///
/// `pct` must lie in `[0, 100]`.
pub fn net_after_commission(gross: Decimal, pct: Decimal) -> ResultEngine<Decimal> {
    if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
        return Err(EngineError::InvalidAmount(format!(
            "commission percentage must be within [0, 100], got {pct}"
        )));
    }
    Ok(gross * (Decimal::ONE - pct / Decimal::ONE_HUNDRED))
}

/// Recomputes `balance_after` for `entries` (in sequence order) starting from
/// `opening`, and returns the closing balance.
///
/// Fails without touching anything if a projected balance goes negative.
pub fn reproject(opening: Decimal, entries: &mut [AccountEntry]) -> ResultEngine<Decimal> {
    let mut balance = opening;
    let mut projected = Vec::with_capacity(entries.len());
    for entry in entries.iter() {
        balance = entry.kind.apply(balance, entry.amount);
        if balance < Decimal::ZERO {
            return Err(EngineError::NegativeBalance(format!(
                "entry #{} of account {} would leave {balance}",
                entry.sequence, entry.account_id
            )));
        }
        projected.push(balance);
    }
    for (entry, balance_after) in entries.iter_mut().zip(projected) {
        entry.balance_after = balance_after;
    }
    Ok(balance)
}

pub mod entries {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "account_transactions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub account_id: String,
        pub sequence: i64,
        pub kind: String,
        pub amount: String,
        pub gross_amount: Option<String>,
        pub balance_after: String,
        pub description: Option<String>,
        pub linked_transaction_id: Option<String>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::Entity",
            from = "Column::AccountId",
            to = "super::Column::Id",
            on_update = "NoAction",
            on_delete = "Cascade"
        )]
        Accounts,
    }

    impl Related<super::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Accounts.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub balance: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "entries::Entity")]
    Entries,
}

impl Related<entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: ActiveValue::Set(account.id.to_string()),
            name: ActiveValue::Set(account.name.clone()),
            balance: ActiveValue::Set(decimal_to_db(account.balance)),
            created_at: ActiveValue::Set(account.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            name: model.name,
            balance: parse_decimal(&model.balance, "account balance")?,
            created_at: model.created_at,
        })
    }
}

impl From<&AccountEntry> for entries::ActiveModel {
    fn from(entry: &AccountEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            sequence: ActiveValue::Set(entry.sequence),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            amount: ActiveValue::Set(decimal_to_db(entry.amount)),
            gross_amount: ActiveValue::Set(entry.gross_amount.map(decimal_to_db)),
            balance_after: ActiveValue::Set(decimal_to_db(entry.balance_after)),
            description: ActiveValue::Set(entry.description.clone()),
            linked_transaction_id: ActiveValue::Set(
                entry.linked_transaction_id.map(|id| id.to_string()),
            ),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<entries::Model> for AccountEntry {
    type Error = EngineError;

    fn try_from(model: entries::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account entry")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            sequence: model.sequence,
            kind: EntryKind::try_from(model.kind.as_str())?,
            amount: parse_decimal(&model.amount, "entry amount")?,
            gross_amount: parse_optional_decimal(model.gross_amount.as_deref(), "gross amount")?,
            balance_after: parse_decimal(&model.balance_after, "balance_after")?,
            description: model.description,
            linked_transaction_id: model
                .linked_transaction_id
                .as_deref()
                .map(|id| parse_uuid(id, "transaction"))
                .transpose()?,
            created_at: model.created_at,
        })
    }
}
