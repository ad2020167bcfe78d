use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Account, AccountEntry, Actor, EngineError, EntryKind, ResultEngine, Transaction,
    accounts::{self, entries},
    net_after_commission, reproject,
    util::{decimal_to_db, ensure_positive, normalize_optional_text, normalize_required_name},
};

use super::{Engine, access::require_admin, with_tx};

/// Entry to append at the end of an account's ledger.
struct NewEntry {
    kind: EntryKind,
    amount: Decimal,
    gross_amount: Option<Decimal>,
    description: Option<String>,
    linked_transaction_id: Option<Uuid>,
}

impl Engine {
    async fn require_account(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id} not exists")))?;
        Account::try_from(model)
    }

    async fn store_account_balance(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        balance: Decimal,
    ) -> ResultEngine<()> {
        accounts::ActiveModel {
            id: ActiveValue::Set(account_id.to_string()),
            balance: ActiveValue::Set(decimal_to_db(balance)),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    async fn last_entry(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Option<AccountEntry>> {
        entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(entries::Column::Sequence)
            .one(db)
            .await?
            .map(AccountEntry::try_from)
            .transpose()
    }

    /// Appends an entry and moves the stored balance with it.
    async fn append_entry(
        &self,
        db: &DatabaseTransaction,
        account: &mut Account,
        new: NewEntry,
    ) -> ResultEngine<AccountEntry> {
        let balance_after = new.kind.apply(account.balance, new.amount);
        if balance_after < Decimal::ZERO {
            return Err(EngineError::NegativeBalance(format!(
                "account {} has {}, cannot withdraw {}",
                account.id, account.balance, new.amount
            )));
        }
        let sequence = self
            .last_entry(db, account.id)
            .await?
            .map_or(1, |last| last.sequence + 1);

        let entry = AccountEntry {
            id: Uuid::new_v4(),
            account_id: account.id,
            sequence,
            kind: new.kind,
            amount: new.amount,
            gross_amount: new.gross_amount,
            balance_after,
            description: new.description,
            linked_transaction_id: new.linked_transaction_id,
            created_at: Utc::now(),
        };
        entries::ActiveModel::from(&entry).insert(db).await?;
        self.store_account_balance(db, account.id, balance_after)
            .await?;
        account.balance = balance_after;
        Ok(entry)
    }

    /// Opens a bolívar account. A positive `initial_balance` is booked as a
    /// deposit entry.
    pub async fn create_account(
        &self,
        actor: &Actor,
        name: &str,
        initial_balance: Decimal,
    ) -> ResultEngine<Account> {
        require_admin(actor, "create accounts")?;
        let name = normalize_required_name(name, "account")?;
        if initial_balance < Decimal::ZERO {
            return Err(EngineError::InvalidAmount(
                "initial balance must be >= 0".to_string(),
            ));
        }
        let account = with_tx!(self, |db_tx| {
            let exists = accounts::Entity::find()
                .filter(accounts::Column::Name.eq(name.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }
            let mut account = Account::new(name, Utc::now());
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            if initial_balance > Decimal::ZERO {
                self.append_entry(
                    &db_tx,
                    &mut account,
                    NewEntry {
                        kind: EntryKind::Deposit,
                        amount: initial_balance,
                        gross_amount: None,
                        description: Some("initial balance".to_string()),
                        linked_transaction_id: None,
                    },
                )
                .await?;
            }
            Ok::<_, EngineError>(account)
        })?;
        tracing::info!(account_id = %account.id, balance = %account.balance, "account created");
        Ok(account)
    }

    pub async fn account(&self, actor: &Actor, account_id: Uuid) -> ResultEngine<Account> {
        require_admin(actor, "read accounts")?;
        with_tx!(self, |db_tx| self.require_account(&db_tx, account_id).await)
    }

    pub async fn accounts(&self, actor: &Actor) -> ResultEngine<Vec<Account>> {
        require_admin(actor, "read accounts")?;
        with_tx!(self, |db_tx| {
            accounts::Entity::find()
                .order_by_asc(accounts::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Account::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Ledger of an account in sequence order.
    pub async fn account_entries(
        &self,
        actor: &Actor,
        account_id: Uuid,
    ) -> ResultEngine<Vec<AccountEntry>> {
        require_admin(actor, "read accounts")?;
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;
            entries::Entity::find()
                .filter(entries::Column::AccountId.eq(account_id.to_string()))
                .order_by_asc(entries::Column::Sequence)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(AccountEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn deposit(
        &self,
        actor: &Actor,
        account_id: Uuid,
        amount: Decimal,
        description: Option<&str>,
    ) -> ResultEngine<AccountEntry> {
        require_admin(actor, "deposit")?;
        ensure_positive(amount, "deposit amount")?;
        let entry = with_tx!(self, |db_tx| {
            let mut account = self.require_account(&db_tx, account_id).await?;
            self.append_entry(
                &db_tx,
                &mut account,
                NewEntry {
                    kind: EntryKind::Deposit,
                    amount,
                    gross_amount: None,
                    description: normalize_optional_text(description),
                    linked_transaction_id: None,
                },
            )
            .await
        })?;
        tracing::info!(%account_id, amount = %amount, balance = %entry.balance_after, "deposit recorded");
        Ok(entry)
    }

    /// Sets the balance to `new_balance`, booking the difference as a deposit
    /// or a withdrawal. Returns `None` when the balance already matches.
    pub async fn set_balance(
        &self,
        actor: &Actor,
        account_id: Uuid,
        new_balance: Decimal,
    ) -> ResultEngine<Option<AccountEntry>> {
        require_admin(actor, "set account balances")?;
        if new_balance < Decimal::ZERO {
            return Err(EngineError::NegativeBalance(format!(
                "account {account_id} cannot be set to {new_balance}"
            )));
        }
        let entry = with_tx!(self, |db_tx| {
            let mut account = self.require_account(&db_tx, account_id).await?;
            let delta = new_balance - account.balance;
            if delta.is_zero() {
                return Ok(None);
            }
            let kind = if delta > Decimal::ZERO {
                EntryKind::Deposit
            } else {
                EntryKind::Withdrawal
            };
            let entry = self
                .append_entry(
                    &db_tx,
                    &mut account,
                    NewEntry {
                        kind,
                        amount: delta.abs(),
                        gross_amount: None,
                        description: Some("balance adjustment".to_string()),
                        linked_transaction_id: None,
                    },
                )
                .await?;
            Ok::<_, EngineError>(Some(entry))
        })?;
        if let Some(entry) = &entry {
            tracing::info!(%account_id, balance = %entry.balance_after, "account balance set");
        }
        Ok(entry)
    }

    /// Withdraws the net payout of a transaction from an account.
    ///
    /// `net = gross * (1 - pct / 100)`; the entry keeps `gross` and is linked
    /// to the transaction, which stores `pct`. A transaction has at most one
    /// linked withdrawal.
    pub async fn record_withdrawal_for_transaction(
        &self,
        actor: &Actor,
        account_id: Uuid,
        transaction_id: Uuid,
        gross_amount: Decimal,
        commission_pct: Decimal,
    ) -> ResultEngine<AccountEntry> {
        require_admin(actor, "record withdrawals")?;
        ensure_positive(gross_amount, "gross amount")?;
        let net = net_after_commission(gross_amount, commission_pct)?;

        let entry = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_model(&db_tx, transaction_id)
                .await?;
            let mut tx = Transaction::try_from(model)?;
            let already_linked = entries::Entity::find()
                .filter(entries::Column::LinkedTransactionId.eq(transaction_id.to_string()))
                .one(&db_tx)
                .await?
                .is_some();
            if already_linked {
                return Err(EngineError::ExistingKey(format!(
                    "withdrawal for transaction {transaction_id}"
                )));
            }

            let mut account = self.require_account(&db_tx, account_id).await?;
            let entry = self
                .append_entry(
                    &db_tx,
                    &mut account,
                    NewEntry {
                        kind: EntryKind::Withdrawal,
                        amount: net,
                        gross_amount: Some(gross_amount),
                        description: Some(format!(
                            "payout to {}",
                            tx.beneficiary.full_name
                        )),
                        linked_transaction_id: Some(transaction_id),
                    },
                )
                .await?;

            tx.bank_commission_percentage = Some(commission_pct);
            tx.last_edited_at = Some(Utc::now());
            self.save_transaction(&db_tx, &tx).await?;
            Ok::<_, EngineError>(entry)
        })?;
        tracing::info!(
            %account_id,
            %transaction_id,
            gross = %gross_amount,
            net = %net,
            balance = %entry.balance_after,
            "withdrawal recorded"
        );
        Ok(entry)
    }

    /// Changes the bank commission of a transaction's withdrawal.
    ///
    /// The linked entry gets the new net amount and every entry from it
    /// onwards is re-projected. Fails with [`EngineError::NegativeBalance`]
    /// if any re-projected balance would go below zero, writing nothing.
    pub async fn update_commission_percentage(
        &self,
        actor: &Actor,
        transaction_id: Uuid,
        commission_pct: Decimal,
    ) -> ResultEngine<Account> {
        require_admin(actor, "update commission percentages")?;
        net_after_commission(Decimal::ZERO, commission_pct)?;

        let account = with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_model(&db_tx, transaction_id)
                .await?;
            let mut tx = Transaction::try_from(model)?;
            let linked = entries::Entity::find()
                .filter(entries::Column::LinkedTransactionId.eq(transaction_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!(
                        "withdrawal for transaction {transaction_id} not exists"
                    ))
                })?;
            let linked = AccountEntry::try_from(linked)?;
            let gross = linked.gross_amount.ok_or_else(|| {
                EngineError::InvalidAmount(format!("entry {} has no gross amount", linked.id))
            })?;
            let mut account = self.require_account(&db_tx, linked.account_id).await?;

            let opening = entries::Entity::find()
                .filter(entries::Column::AccountId.eq(account.id.to_string()))
                .filter(entries::Column::Sequence.lt(linked.sequence))
                .order_by_desc(entries::Column::Sequence)
                .one(&db_tx)
                .await?
                .map(AccountEntry::try_from)
                .transpose()?
                .map_or(Decimal::ZERO, |previous| previous.balance_after);

            let mut tail = entries::Entity::find()
                .filter(entries::Column::AccountId.eq(account.id.to_string()))
                .filter(entries::Column::Sequence.gte(linked.sequence))
                .order_by_asc(entries::Column::Sequence)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(AccountEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            if let Some(first) = tail.first_mut() {
                first.amount = net_after_commission(gross, commission_pct)?;
            }
            let closing = reproject(opening, &mut tail)?;

            for entry in &tail {
                entries::ActiveModel::from(entry).update(&db_tx).await?;
            }
            self.store_account_balance(&db_tx, account.id, closing)
                .await?;
            account.balance = closing;

            tx.bank_commission_percentage = Some(commission_pct);
            tx.last_edited_at = Some(Utc::now());
            self.save_transaction(&db_tx, &tx).await?;
            Ok::<_, EngineError>(account)
        })?;
        tracing::info!(
            %transaction_id,
            account_id = %account.id,
            pct = %commission_pct,
            balance = %account.balance,
            "bank commission updated"
        );
        Ok(account)
    }

    /// Rebuilds every `balance_after` of an account and its stored balance by
    /// replaying the ledger from the first entry.
    pub async fn recompute_account_balance(
        &self,
        actor: &Actor,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        require_admin(actor, "recompute balances")?;
        let account = with_tx!(self, |db_tx| {
            let mut account = self.require_account(&db_tx, account_id).await?;
            let mut ledger = entries::Entity::find()
                .filter(entries::Column::AccountId.eq(account_id.to_string()))
                .order_by_asc(entries::Column::Sequence)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(AccountEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let stale: Vec<Decimal> = ledger.iter().map(|e| e.balance_after).collect();
            let closing = reproject(Decimal::ZERO, &mut ledger)?;

            for (entry, previous) in ledger.iter().zip(stale) {
                if entry.balance_after != previous {
                    entries::ActiveModel {
                        id: ActiveValue::Set(entry.id.to_string()),
                        balance_after: ActiveValue::Set(decimal_to_db(entry.balance_after)),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?;
                }
            }
            self.store_account_balance(&db_tx, account_id, closing)
                .await?;
            account.balance = closing;
            Ok::<_, EngineError>(account)
        })?;
        tracing::info!(%account_id, balance = %account.balance, "account balance recomputed");
        Ok(account)
    }
}
