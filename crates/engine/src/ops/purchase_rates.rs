use chrono::Utc;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, DateRange, EngineError, PurchaseRateAction, PurchaseRateTarget, ResultEngine, Role,
    Transaction, TransactionStatus, TransactionType, transactions, util::ensure_positive_rate,
};

use super::{
    Engine,
    access::{require_admin, require_role},
    with_tx,
};

/// Result of a purchase-rate action on one transaction of a batch.
#[derive(Debug, PartialEq)]
pub struct PurchaseRateOutcome {
    pub transaction_id: Uuid,
    pub result: Result<Transaction, EngineError>,
}

impl PurchaseRateOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

fn validate_action(action: PurchaseRateAction) -> ResultEngine<()> {
    if let PurchaseRateAction::Edit { rate, .. } = action {
        ensure_positive_rate(rate, "purchase_rate")?;
    }
    Ok(())
}

fn apply_action(tx: &mut Transaction, action: PurchaseRateAction) -> ResultEngine<()> {
    // USD transfers settle at their own rates and never read a purchase rate.
    if tx.status != TransactionStatus::Completado
        || tx.transaction_type != TransactionType::Normal
    {
        return Err(EngineError::PurchaseRateNotApplicable {
            id: tx.id,
            status: tx.status,
        });
    }
    match action {
        PurchaseRateAction::Edit { rate, is_final } => {
            tx.purchase_rate = Some(rate);
            tx.is_purchase_rate_set = true;
            tx.purchase_rate_final = is_final;
        }
        PurchaseRateAction::MarkFinal => {
            if tx.purchase_rate.is_none() {
                return Err(EngineError::NoRateToFinalize(tx.id));
            }
            tx.purchase_rate_final = true;
        }
        PurchaseRateAction::Remove => {
            tx.purchase_rate = None;
            tx.is_purchase_rate_set = false;
            tx.purchase_rate_final = false;
        }
    }
    tx.last_edited_at = Some(Utc::now());
    Ok(())
}

impl Engine {
    async fn assign_purchase_rate(
        &self,
        transaction_id: Uuid,
        action: PurchaseRateAction,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_model(&db_tx, transaction_id)
                .await?;
            let mut tx = Transaction::try_from(model)?;
            apply_action(&mut tx, action)?;
            self.save_transaction(&db_tx, &tx).await?;
            Ok(tx)
        })
    }

    /// Completed NORMAL transactions in `range` the action is meaningful for.
    async fn purchase_rate_candidates(
        &self,
        range: DateRange,
        action: PurchaseRateAction,
    ) -> ResultEngine<Vec<Uuid>> {
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::Status.eq(TransactionStatus::Completado.as_str()))
                .filter(transactions::Column::TransactionType.eq(TransactionType::Normal.as_str()))
                .filter(transactions::Column::CreatedAt.gte(range.from))
                .filter(transactions::Column::CreatedAt.lt(range.to));
            query = match action {
                PurchaseRateAction::Edit { .. } => {
                    query.filter(transactions::Column::IsPurchaseRateSet.eq(false))
                }
                PurchaseRateAction::MarkFinal => query
                    .filter(transactions::Column::IsPurchaseRateSet.eq(true))
                    .filter(transactions::Column::PurchaseRateFinal.eq(false)),
                PurchaseRateAction::Remove => {
                    query.filter(transactions::Column::IsPurchaseRateSet.eq(true))
                }
            };
            query
                .order_by_asc(transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| Transaction::try_from(model).map(|tx| tx.id))
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Applies a purchase-rate action to one completed transaction.
    ///
    /// Authorization: admin Venezuela.
    pub async fn set_purchase_rate(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        action: PurchaseRateAction,
    ) -> ResultEngine<Transaction> {
        require_role(actor, &[Role::AdminVenezuela], "assign purchase rates")?;
        validate_action(action)?;
        let tx = self.assign_purchase_rate(transaction_id, action).await?;
        tracing::info!(
            transaction_id = %tx.id,
            mode = action.as_str(),
            purchase_rate = ?tx.purchase_rate,
            "purchase rate updated"
        );
        Ok(tx)
    }

    /// Applies a purchase-rate action to many transactions.
    ///
    /// Each transaction is updated in its own DB transaction; a failure on one
    /// id is reported in its outcome and does not stop the batch.
    pub async fn apply_purchase_rate(
        &self,
        actor: &Actor,
        action: PurchaseRateAction,
        target: PurchaseRateTarget,
    ) -> ResultEngine<Vec<PurchaseRateOutcome>> {
        require_role(actor, &[Role::AdminVenezuela], "assign purchase rates")?;
        validate_action(action)?;

        let ids = match target {
            PurchaseRateTarget::Ids { ids } => ids,
            PurchaseRateTarget::Range { range } => {
                self.purchase_rate_candidates(range, action).await?
            }
        };

        let mut outcomes = Vec::with_capacity(ids.len());
        for transaction_id in ids {
            let result = self.assign_purchase_rate(transaction_id, action).await;
            if let Err(err) = &result {
                tracing::debug!(%transaction_id, mode = action.as_str(), "purchase rate skipped: {err}");
            }
            outcomes.push(PurchaseRateOutcome {
                transaction_id,
                result,
            });
        }

        let applied = outcomes.iter().filter(|o| o.is_ok()).count();
        tracing::info!(
            mode = action.as_str(),
            applied,
            failed = outcomes.len() - applied,
            "purchase rates applied"
        );
        Ok(outcomes)
    }

    /// Completed NORMAL transactions still lacking a purchase rate, oldest
    /// first.
    pub async fn pending_purchase_rate(
        &self,
        actor: &Actor,
        range: Option<DateRange>,
    ) -> ResultEngine<Vec<Transaction>> {
        require_admin(actor, "list pending purchase rates")?;
        with_tx!(self, |db_tx| {
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::Status.eq(TransactionStatus::Completado.as_str()))
                .filter(transactions::Column::TransactionType.eq(TransactionType::Normal.as_str()))
                .filter(transactions::Column::IsPurchaseRateSet.eq(false));
            if let Some(range) = range {
                query = query
                    .filter(transactions::Column::CreatedAt.gte(range.from))
                    .filter(transactions::Column::CreatedAt.lt(range.to));
            }
            query
                .order_by_asc(transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
