//! Settlement and reconciliation engine for COP → VES remittances.
//!
//! The [`Engine`] owns a sea-orm connection and exposes async operations for
//! the rate ledger, the transaction lifecycle, purchase-rate assignment, the
//! Colombia → Venezuela debt ledger, vendor commissions and bolívar accounts.
//! Pure calculators ([`Settlement`], [`commission_for`], [`reproject`], the
//! rate conversions) are usable without a database.

pub use accounts::{Account, AccountEntry, EntryKind, net_after_commission, reproject};
pub use commands::{
    CommissionFilter, CreateTransactionCmd, PurchaseRateAction, PurchaseRateTarget,
    RecordPaymentCmd, StatusChangeCmd,
};
pub use commission::{
    CommissionLine, CommissionReport, VendorCommissionTotals, VendorNetwork, commission_for,
    commission_rate,
};
pub use currency::Currency;
pub use error::EngineError;
pub use history::HistoryEntry;
pub use money::{Money, RATE_SCALE, parse_decimal_input};
pub use notify::{Notification, Notifier, NotifyError, TracingNotifier};
pub use ops::{Engine, EngineBuilder, PurchaseRateOutcome, TransactionListFilter};
pub use payments::VenezuelaPayment;
pub use period::{BUSINESS_TZ, DateRange, DebtPeriod};
pub use rates::{
    CurrentRates, RateKind, RateQuote, bs_to_cop, cop_to_bs, cop_to_usd, usd_to_bs, usd_to_cop,
};
pub use settlement::{
    DebtLine, DebtSummary, Settlement, SettlementTotals, UsdVolume, VenezuelaEarnings,
};
pub use status::{TransactionStatus, authorize_transition};
pub use transactions::{
    BeneficiarySnapshot, Pricing, Transaction, TransactionType, TransferAmount,
    VendorPaymentMethod, price_transfer,
};
pub use users::{Actor, Role, User};

pub mod accounts;
mod commands;
mod commission;
mod currency;
mod error;
pub mod history;
mod money;
mod notify;
mod ops;
pub mod payments;
mod period;
pub mod rates;
mod settlement;
mod status;
pub mod transactions;
pub mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
