use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, CreateTransactionCmd, EngineError, HistoryEntry, Notification, ResultEngine,
    StatusChangeCmd, Transaction, TransactionStatus, TransactionType, authorize_transition,
    history, price_transfer, transactions,
    util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC and
/// applied to `created_at`.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of statuses to return.
    pub statuses: Option<Vec<TransactionStatus>>,
    pub transaction_type: Option<TransactionType>,
    /// Only honoured for admins; other actors always see their own rows.
    pub created_by: Option<String>,
    pub limit: Option<u64>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidAmount(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.statuses.as_ref().is_some_and(|s| s.is_empty()) {
        return Err(EngineError::InvalidAmount(
            "statuses must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    pub(super) async fn save_transaction(
        &self,
        db: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        let model: transactions::ActiveModel = tx.into();
        model.update(db).await?;
        Ok(())
    }

    /// Creates a transaction in `PENDIENTE`, freezing its amounts against the
    /// current sale rate of its type (or the negotiated `custom_rate`).
    pub async fn create_transaction(
        &self,
        actor: &Actor,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let tx = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &actor.user_id).await?;

            let kind = cmd.transaction_type.rate_kind();
            let sale_rate = match cmd.custom_rate {
                Some(rate) => rate,
                None => {
                    self.find_current_rate(&db_tx, kind)
                        .await?
                        .ok_or(EngineError::NoRateAvailable(kind))?
                        .sale_rate
                }
            };
            let pricing = price_transfer(cmd.transaction_type, cmd.amount, sale_rate)?;

            let mut tx = Transaction::new(
                actor.user_id.clone(),
                cmd.beneficiary,
                cmd.transaction_type,
                pricing,
                cmd.custom_rate.is_some(),
                cmd.created_at,
            );
            tx.vendor_payment_method = cmd.vendor_payment_method;
            tx.client_proof = normalize_optional_text(cmd.client_proof.as_deref());
            tx.notes = normalize_optional_text(cmd.notes.as_deref());

            let model: transactions::ActiveModel = (&tx).into();
            model.insert(&db_tx).await?;

            let entry = HistoryEntry::new(
                tx.id,
                None,
                tx.status,
                Some("created".to_string()),
                actor.user_id.clone(),
                Utc::now(),
            );
            history::ActiveModel::from(&entry).insert(&db_tx).await?;
            Ok::<_, EngineError>(tx)
        })?;

        tracing::info!(
            transaction_id = %tx.id,
            created_by = %tx.created_by,
            transaction_type = tx.transaction_type.as_str(),
            amount_bs = %tx.amount_bs,
            sale_rate = %tx.sale_rate,
            "transaction created"
        );
        Ok(tx)
    }

    /// Return a transaction snapshot from DB.
    pub async fn transaction(&self, actor: &Actor, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_visible_transaction(&db_tx, actor, transaction_id)
                .await?;
            Transaction::try_from(model)
        })
    }

    /// Lists transactions newest first.
    pub async fn transactions(
        &self,
        actor: &Actor,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;
        let created_by = if actor.role.is_admin() {
            filter.created_by.clone()
        } else {
            Some(actor.user_id.clone())
        };

        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find();
            if let Some(from) = filter.from {
                query = query.filter(transactions::Column::CreatedAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(transactions::Column::CreatedAt.lt(to));
            }
            if let Some(statuses) = &filter.statuses {
                let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
                query = query.filter(transactions::Column::Status.is_in(statuses));
            }
            if let Some(kind) = filter.transaction_type {
                query = query.filter(transactions::Column::TransactionType.eq(kind.as_str()));
            }
            if let Some(created_by) = &created_by {
                query = query.filter(transactions::Column::CreatedBy.eq(created_by.as_str()));
            }
            if let Some(limit) = filter.limit {
                query = query.limit(limit);
            }
            query
                .order_by_desc(transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Status history of a transaction, oldest first.
    pub async fn transaction_history(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<HistoryEntry>> {
        with_tx!(self, |db_tx| {
            self.require_visible_transaction(&db_tx, actor, transaction_id)
                .await?;
            history::Entity::find()
                .filter(history::Column::TransactionId.eq(transaction_id.to_string()))
                .order_by_asc(history::Column::ChangedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(HistoryEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Moves a transaction along its lifecycle.
    ///
    /// The status update and its history row commit together; the owner is
    /// notified afterwards. Illegal edges fail with
    /// [`EngineError::InvalidTransition`] and legal edges taken by the wrong
    /// actor with [`EngineError::Forbidden`], writing nothing.
    pub async fn transition_status(
        &self,
        actor: &Actor,
        cmd: StatusChangeCmd,
    ) -> ResultEngine<Transaction> {
        let note = normalize_optional_text(cmd.note.as_deref());
        let proof = normalize_optional_text(cmd.venezuela_proof.as_deref());
        let (tx, previous) = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_model(&db_tx, cmd.transaction_id)
                .await?;
            let mut tx = Transaction::try_from(model)?;
            let previous = tx.status;
            authorize_transition(previous, cmd.status, actor, &tx.created_by)?;

            let now = Utc::now();
            tx.status = cmd.status;
            tx.last_edited_at = Some(now);
            if proof.is_some() {
                tx.venezuela_proof = proof;
            }
            self.save_transaction(&db_tx, &tx).await?;

            let entry = HistoryEntry::new(
                tx.id,
                Some(previous),
                tx.status,
                note,
                actor.user_id.clone(),
                now,
            );
            history::ActiveModel::from(&entry).insert(&db_tx).await?;
            Ok::<_, EngineError>((tx, previous))
        })?;

        tracing::info!(
            transaction_id = %tx.id,
            from = %previous,
            to = %tx.status,
            changed_by = %actor.user_id,
            "transaction status changed"
        );
        self.notify(Notification {
            user_id: tx.created_by.clone(),
            title: "Transaction status changed".to_string(),
            message: format!(
                "Transfer to {} moved from {previous} to {}",
                tx.beneficiary.full_name, tx.status
            ),
            transaction_id: Some(tx.id),
        });
        Ok(tx)
    }
}
