//! Command structs for engine operations.
//!
//! These types group parameters for write operations (transaction creation,
//! status changes, purchase-rate assignment, payments), keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    BeneficiarySnapshot, DateRange, TransactionStatus, TransactionType, TransferAmount,
    VendorPaymentMethod,
};

/// Create a remittance transaction.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub beneficiary: BeneficiarySnapshot,
    pub transaction_type: TransactionType,
    pub amount: TransferAmount,
    /// Negotiated sale rate replacing the current quote.
    pub custom_rate: Option<Decimal>,
    pub vendor_payment_method: Option<VendorPaymentMethod>,
    pub client_proof: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        beneficiary: BeneficiarySnapshot,
        transaction_type: TransactionType,
        amount: TransferAmount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            beneficiary,
            transaction_type,
            amount,
            custom_rate: None,
            vendor_payment_method: None,
            client_proof: None,
            notes: None,
            created_at,
        }
    }

    #[must_use]
    pub fn custom_rate(mut self, rate: Decimal) -> Self {
        self.custom_rate = Some(rate);
        self
    }

    #[must_use]
    pub fn vendor_payment_method(mut self, method: VendorPaymentMethod) -> Self {
        self.vendor_payment_method = Some(method);
        self
    }

    #[must_use]
    pub fn client_proof(mut self, path: impl Into<String>) -> Self {
        self.client_proof = Some(path.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Move a transaction to another status.
#[derive(Clone, Debug)]
pub struct StatusChangeCmd {
    pub transaction_id: Uuid,
    pub status: TransactionStatus,
    pub note: Option<String>,
    /// Blob-storage path of Venezuela's payout proof.
    pub venezuela_proof: Option<String>,
}

impl StatusChangeCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid, status: TransactionStatus) -> Self {
        Self {
            transaction_id,
            status,
            note: None,
            venezuela_proof: None,
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub fn venezuela_proof(mut self, path: impl Into<String>) -> Self {
        self.venezuela_proof = Some(path.into());
        self
    }
}

/// What to do with the purchase rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum PurchaseRateAction {
    Edit { rate: Decimal, is_final: bool },
    MarkFinal,
    Remove,
}

impl PurchaseRateAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Edit { .. } => "edit",
            Self::MarkFinal => "mark_final",
            Self::Remove => "remove",
        }
    }
}

/// Which transactions a purchase-rate action applies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "target")]
pub enum PurchaseRateTarget {
    Ids { ids: Vec<Uuid> },
    /// Completed transactions created in `[from, to)` that the action is
    /// meaningful for.
    Range { range: DateRange },
}

/// Record a payment from Colombia to Venezuela.
#[derive(Clone, Debug)]
pub struct RecordPaymentCmd {
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub proof_url: Option<String>,
}

impl RecordPaymentCmd {
    #[must_use]
    pub fn new(amount: Decimal, payment_date: DateTime<Utc>) -> Self {
        Self {
            amount,
            payment_date,
            notes: None,
            proof_url: None,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn proof_url(mut self, url: impl Into<String>) -> Self {
        self.proof_url = Some(url.into());
        self
    }
}

/// Filters for the vendor commission report.
#[derive(Clone, Debug, Default)]
pub struct CommissionFilter {
    pub range: Option<DateRange>,
    pub vendor_id: Option<String>,
    pub unpaid_only: bool,
}
