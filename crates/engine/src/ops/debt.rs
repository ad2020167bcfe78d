use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, DateRange, DebtLine, DebtPeriod, DebtSummary, EngineError, RecordPaymentCmd,
    ResultEngine, Role, Settlement, SettlementTotals, Transaction, TransactionStatus,
    VenezuelaEarnings, VenezuelaPayment, payments, transactions, users,
    util::normalize_optional_text,
};

use super::{
    Engine,
    access::{require_admin, require_role},
    with_tx,
};

impl Engine {
    /// Completed transactions created in `range`, oldest first.
    pub(super) async fn completed_in_range(
        &self,
        db: &DatabaseTransaction,
        range: DateRange,
    ) -> ResultEngine<Vec<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Completado.as_str()))
            .filter(transactions::Column::CreatedAt.gte(range.from))
            .filter(transactions::Column::CreatedAt.lt(range.to))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    pub(super) async fn user_names(
        &self,
        db: &DatabaseTransaction,
    ) -> ResultEngine<HashMap<String, String>> {
        Ok(users::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|model| (model.id, model.name))
            .collect())
    }

    async fn payments_in_range(
        &self,
        db: &DatabaseTransaction,
        range: DateRange,
    ) -> ResultEngine<Vec<VenezuelaPayment>> {
        payments::Entity::find()
            .filter(payments::Column::PaymentDate.gte(range.from))
            .filter(payments::Column::PaymentDate.lt(range.to))
            .order_by_asc(payments::Column::PaymentDate)
            .all(db)
            .await?
            .into_iter()
            .map(VenezuelaPayment::try_from)
            .collect()
    }

    /// What Colombia owes Venezuela for transactions created in `range`,
    /// minus the payments dated in `range`.
    ///
    /// Authorization: either admin.
    pub async fn debt_summary(&self, actor: &Actor, range: DateRange) -> ResultEngine<DebtSummary> {
        require_admin(actor, "read the debt summary")?;
        with_tx!(self, |db_tx| {
            let completed = self.completed_in_range(&db_tx, range).await?;
            let names = self.user_names(&db_tx).await?;
            let totals = SettlementTotals::from_transactions(&completed);

            let lines = completed
                .iter()
                .filter_map(|tx| {
                    let settlement = Settlement::for_transaction(tx)?;
                    Some(DebtLine {
                        transaction_id: tx.id,
                        created_at: tx.created_at,
                        vendor_id: tx.created_by.clone(),
                        vendor_name: names.get(&tx.created_by).cloned(),
                        beneficiary_name: tx.beneficiary.full_name.clone(),
                        amount_cop: tx.amount_cop?,
                        amount_bs: tx.amount_bs,
                        purchase_rate: tx.purchase_rate?,
                        is_paid_to_venezuela: tx.is_paid_to_venezuela,
                        settlement,
                    })
                })
                .collect();

            let payments = self.payments_in_range(&db_tx, range).await?;
            Ok(DebtSummary::new(range.from, range.to, totals, lines, payments))
        })
    }

    /// [`Engine::debt_summary`] over a Bogotá calendar period ending today.
    pub async fn debt_summary_for(
        &self,
        actor: &Actor,
        period: DebtPeriod,
    ) -> ResultEngine<DebtSummary> {
        let range = period.resolve(Utc::now())?;
        self.debt_summary(actor, range).await
    }

    /// Appends a payment from Colombia to Venezuela.
    ///
    /// Authorization: admin Colombia.
    pub async fn record_payment(
        &self,
        actor: &Actor,
        cmd: RecordPaymentCmd,
    ) -> ResultEngine<VenezuelaPayment> {
        require_role(actor, &[Role::AdminColombia], "record payments")?;
        let payment = VenezuelaPayment::new(
            cmd.amount,
            cmd.payment_date,
            normalize_optional_text(cmd.notes.as_deref()),
            normalize_optional_text(cmd.proof_url.as_deref()),
            actor.user_id.clone(),
            Utc::now(),
        )?;
        with_tx!(self, |db_tx| {
            payments::ActiveModel::from(&payment).insert(&db_tx).await?;
            Ok::<_, EngineError>(())
        })?;
        tracing::info!(
            payment_id = %payment.id,
            amount = %payment.amount,
            payment_date = %payment.payment_date,
            "payment to Venezuela recorded"
        );
        Ok(payment)
    }

    /// Payments dated in `range`, oldest first.
    pub async fn payments(
        &self,
        actor: &Actor,
        range: DateRange,
    ) -> ResultEngine<Vec<VenezuelaPayment>> {
        require_admin(actor, "list payments")?;
        with_tx!(self, |db_tx| self.payments_in_range(&db_tx, range).await)
    }

    /// Flags transactions as settled with Venezuela.
    ///
    /// Bookkeeping only: debt totals always come from payments. Already
    /// flagged transactions keep their first `paid_to_venezuela_at`. All ids
    /// must exist or nothing is written.
    pub async fn mark_paid_to_venezuela(
        &self,
        actor: &Actor,
        transaction_ids: &[Uuid],
    ) -> ResultEngine<Vec<Transaction>> {
        require_admin(actor, "mark transactions paid to Venezuela")?;
        let now = Utc::now();
        let updated = with_tx!(self, |db_tx| {
            let mut updated = Vec::with_capacity(transaction_ids.len());
            for transaction_id in transaction_ids {
                let model = self
                    .require_transaction_model(&db_tx, *transaction_id)
                    .await?;
                let mut tx = Transaction::try_from(model)?;
                if !tx.is_paid_to_venezuela {
                    tx.is_paid_to_venezuela = true;
                    tx.paid_to_venezuela_at = Some(now);
                    self.save_transaction(&db_tx, &tx).await?;
                }
                updated.push(tx);
            }
            Ok::<_, EngineError>(updated)
        })?;
        tracing::info!(count = updated.len(), "transactions marked paid to Venezuela");
        Ok(updated)
    }

    /// Venezuela's half of the profit over transactions created in `range`.
    pub async fn venezuela_earnings(
        &self,
        actor: &Actor,
        range: DateRange,
    ) -> ResultEngine<VenezuelaEarnings> {
        require_admin(actor, "read Venezuela earnings")?;
        with_tx!(self, |db_tx| {
            let completed = self.completed_in_range(&db_tx, range).await?;
            let totals = SettlementTotals::from_transactions(&completed);
            Ok(VenezuelaEarnings::from_totals(range.from, range.to, &totals))
        })
    }
}
