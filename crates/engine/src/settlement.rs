//! Profit split and debt computation.
//!
//! For a settled transaction (completed, NORMAL, purchase rate known):
//!
//! ```text
//! investment          = amount_bs * purchase_rate
//! system_profit       = amount_cop - investment
//! admin_*_share       = system_profit / 2
//! debt_to_venezuela   = investment + admin_venezuela_share
//! ```
//!
//! Everything here is pure and keeps full decimal precision; rounding is a
//! presentation concern.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Transaction, TransactionStatus, TransactionType, VenezuelaPayment};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub investment: Decimal,
    pub system_profit: Decimal,
    pub admin_venezuela_share: Decimal,
    pub admin_colombia_share: Decimal,
    pub debt_to_venezuela: Decimal,
}

impl Settlement {
    pub fn compute(amount_cop: Decimal, amount_bs: Decimal, purchase_rate: Decimal) -> Self {
        let investment = amount_bs * purchase_rate;
        let system_profit = amount_cop - investment;
        let half = system_profit / Decimal::TWO;
        Self {
            investment,
            system_profit,
            admin_venezuela_share: half,
            admin_colombia_share: half,
            debt_to_venezuela: investment + half,
        }
    }

    /// Settlement of a transaction, or `None` when it is not settleable yet
    /// (or never will be, for USD products).
    pub fn for_transaction(tx: &Transaction) -> Option<Self> {
        if tx.status != TransactionStatus::Completado || tx.transaction_type != TransactionType::Normal
        {
            return None;
        }
        let amount_cop = tx.amount_cop?;
        let purchase_rate = tx.purchase_rate?;
        Some(Self::compute(amount_cop, tx.amount_bs, purchase_rate))
    }
}

/// Volume of USD-denominated products, reported apart from the settlement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsdVolume {
    pub count: u64,
    pub amount_usd: Decimal,
    pub amount_bs: Decimal,
}

/// Aggregate over a set of completed transactions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTotals {
    pub settled_count: u64,
    /// Completed NORMAL transactions still lacking a purchase rate.
    pub pending_count: u64,
    pub total_amount_cop: Decimal,
    pub total_amount_bs: Decimal,
    pub total_investment: Decimal,
    pub total_profit: Decimal,
    pub total_admin_venezuela_share: Decimal,
    pub total_admin_colombia_share: Decimal,
    pub total_debt: Decimal,
    pub usd_volume: UsdVolume,
}

impl SettlementTotals {
    /// Folds one transaction in. Non-completed transactions are ignored.
    pub fn add(&mut self, tx: &Transaction) {
        if tx.status != TransactionStatus::Completado {
            return;
        }
        if tx.transaction_type.is_usd() {
            self.usd_volume.count += 1;
            self.usd_volume.amount_usd += tx.amount_usd.unwrap_or_default();
            self.usd_volume.amount_bs += tx.amount_bs;
            return;
        }
        let Some(settlement) = Settlement::for_transaction(tx) else {
            self.pending_count += 1;
            return;
        };
        self.settled_count += 1;
        self.total_amount_cop += tx.amount_cop.unwrap_or_default();
        self.total_amount_bs += tx.amount_bs;
        self.total_investment += settlement.investment;
        self.total_profit += settlement.system_profit;
        self.total_admin_venezuela_share += settlement.admin_venezuela_share;
        self.total_admin_colombia_share += settlement.admin_colombia_share;
        self.total_debt += settlement.debt_to_venezuela;
    }

    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Self {
        let mut totals = Self::default();
        for tx in transactions {
            totals.add(tx);
        }
        totals
    }
}

/// One settled transaction in a debt summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtLine {
    pub transaction_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub vendor_id: String,
    pub vendor_name: Option<String>,
    pub beneficiary_name: String,
    pub amount_cop: Decimal,
    pub amount_bs: Decimal,
    pub purchase_rate: Decimal,
    pub is_paid_to_venezuela: bool,
    pub settlement: Settlement,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub totals: SettlementTotals,
    pub total_debt: Decimal,
    pub total_paid: Decimal,
    /// `total_debt - total_paid`; negative when Colombia overpaid.
    pub pending_debt: Decimal,
    pub lines: Vec<DebtLine>,
    pub payments: Vec<VenezuelaPayment>,
}

impl DebtSummary {
    pub fn new(
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        totals: SettlementTotals,
        lines: Vec<DebtLine>,
        payments: Vec<VenezuelaPayment>,
    ) -> Self {
        let total_paid = payments.iter().map(|p| p.amount).sum::<Decimal>();
        Self {
            from,
            to,
            totals,
            total_debt: totals.total_debt,
            total_paid,
            pending_debt: totals.total_debt - total_paid,
            lines,
            payments,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenezuelaEarnings {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub settled_count: u64,
    pub pending_count: u64,
    pub total_profit: Decimal,
    pub admin_venezuela_share: Decimal,
}

impl VenezuelaEarnings {
    pub fn from_totals(from: DateTime<Utc>, to: DateTime<Utc>, totals: &SettlementTotals) -> Self {
        Self {
            from,
            to,
            settled_count: totals.settled_count,
            pending_count: totals.pending_count,
            total_profit: totals.total_profit,
            admin_venezuela_share: totals.total_admin_venezuela_share,
        }
    }
}
