//! Append-only audit trail of status changes.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TransactionStatus, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    /// `None` on the creation row.
    pub previous_status: Option<TransactionStatus>,
    pub status: TransactionStatus,
    pub note: Option<String>,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        transaction_id: Uuid,
        previous_status: Option<TransactionStatus>,
        status: TransactionStatus,
        note: Option<String>,
        changed_by: String,
        changed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            previous_status,
            status,
            note,
            changed_by,
            changed_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub previous_status: Option<String>,
    pub status: String,
    pub note: Option<String>,
    pub changed_by: String,
    pub changed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&HistoryEntry> for ActiveModel {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            previous_status: ActiveValue::Set(
                entry.previous_status.map(|s| s.as_str().to_string()),
            ),
            status: ActiveValue::Set(entry.status.as_str().to_string()),
            note: ActiveValue::Set(entry.note.clone()),
            changed_by: ActiveValue::Set(entry.changed_by.clone()),
            changed_at: ActiveValue::Set(entry.changed_at),
        }
    }
}

impl TryFrom<Model> for HistoryEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "history")?,
            transaction_id: parse_uuid(&model.transaction_id, "transaction")?,
            previous_status: model
                .previous_status
                .as_deref()
                .map(TransactionStatus::try_from)
                .transpose()?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            note: model.note,
            changed_by: model.changed_by,
            changed_at: model.changed_at,
        })
    }
}
