use std::collections::HashMap;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, CommissionFilter, CommissionLine, CommissionReport, EngineError, ResultEngine, Role,
    Transaction, TransactionStatus, User, VendorNetwork, commission_for, commission_rate,
    transactions, users,
};

use super::{Engine, access::require_admin, with_tx};

impl Engine {
    /// Commission line items for completed vendor transactions.
    ///
    /// Admins may filter by vendor; vendors always get their own report.
    pub async fn vendor_commissions(
        &self,
        actor: &Actor,
        filter: &CommissionFilter,
    ) -> ResultEngine<CommissionReport> {
        let vendor_id = match actor.role {
            Role::AdminColombia | Role::AdminVenezuela => filter.vendor_id.clone(),
            Role::Vendedor => Some(actor.user_id.clone()),
            Role::Cliente => {
                return Err(EngineError::Forbidden(format!(
                    "{} cannot read commissions",
                    actor.role
                )));
            }
        };

        with_tx!(self, |db_tx| {
            let users: HashMap<String, User> = users::Entity::find()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| User::try_from(model).map(|user| (user.id.clone(), user)))
                .collect::<ResultEngine<_>>()?;

            let mut query = transactions::Entity::find()
                .filter(transactions::Column::Status.eq(TransactionStatus::Completado.as_str()))
                .filter(transactions::Column::AmountCop.is_not_null());
            if let Some(range) = filter.range {
                query = query
                    .filter(transactions::Column::CreatedAt.gte(range.from))
                    .filter(transactions::Column::CreatedAt.lt(range.to));
            }
            if let Some(vendor_id) = &vendor_id {
                query = query.filter(transactions::Column::CreatedBy.eq(vendor_id.as_str()));
            }
            if filter.unpaid_only {
                query = query.filter(transactions::Column::IsCommissionPaidToVendor.eq(false));
            }
            let models = query
                .order_by_asc(transactions::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut lines = Vec::new();
            for model in models {
                let tx = Transaction::try_from(model)?;
                let Some(vendor) = users.get(&tx.created_by) else {
                    continue;
                };
                if vendor.role != Role::Vendedor {
                    continue;
                }
                let supervisor_role = vendor
                    .reports_to
                    .as_ref()
                    .and_then(|id| users.get(id))
                    .map(|user| user.role);
                let network = VendorNetwork::from_supervisor(supervisor_role);
                let Some(commission) = commission_for(&tx, network) else {
                    continue;
                };
                lines.push(CommissionLine {
                    transaction_id: tx.id,
                    vendor_id: vendor.id.clone(),
                    vendor_name: vendor.name.clone(),
                    network,
                    created_at: tx.created_at,
                    amount_cop: tx.amount_cop.unwrap_or_default(),
                    custom_rate_used: tx.custom_rate_used,
                    rate: commission_rate(network, tx.custom_rate_used),
                    commission,
                    is_paid: tx.is_commission_paid_to_vendor,
                });
            }
            Ok(CommissionReport::from_lines(lines))
        })
    }

    /// Flags vendor commissions as paid.
    ///
    /// Every id must exist and be completed, otherwise nothing is written.
    /// Flagging an already paid commission is a no-op.
    pub async fn mark_commission_paid(
        &self,
        actor: &Actor,
        transaction_ids: &[Uuid],
    ) -> ResultEngine<Vec<Transaction>> {
        require_admin(actor, "mark commissions paid")?;
        let updated = with_tx!(self, |db_tx| {
            let mut updated = Vec::with_capacity(transaction_ids.len());
            for transaction_id in transaction_ids {
                let model = self
                    .require_transaction_model(&db_tx, *transaction_id)
                    .await?;
                let mut tx = Transaction::try_from(model)?;
                if tx.status != TransactionStatus::Completado {
                    return Err(EngineError::CommissionNotApplicable(format!(
                        "transaction {transaction_id} is {}",
                        tx.status
                    )));
                }
                if !tx.is_commission_paid_to_vendor {
                    tx.is_commission_paid_to_vendor = true;
                    self.save_transaction(&db_tx, &tx).await?;
                }
                updated.push(tx);
            }
            Ok::<_, EngineError>(updated)
        })?;
        tracing::info!(count = updated.len(), "vendor commissions marked paid");
        Ok(updated)
    }
}
