//! Remittance transaction records.
//!
//! A [`Transaction`] carries the amounts of one transfer in two or three
//! currencies, the rates applied, and its lifecycle [`TransactionStatus`].
//!
//! `amount_bs` and `sale_rate` are frozen at creation; later rate quotes never
//! touch existing rows. Once completed, the only mutable fields are the
//! side-channel ones: purchase rate, bank commission percentage and the
//! paid-to-Venezuela / commission-paid flags.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, RateKind, ResultEngine, TransactionStatus,
    rates::{bs_to_cop, cop_to_bs, usd_to_bs},
    util::{decimal_to_db, ensure_positive, ensure_positive_rate, parse_decimal, parse_optional_decimal, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// COP collected, Bs paid out.
    Normal,
    Paypal,
    Zelle,
    Dolares,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Paypal => "paypal",
            Self::Zelle => "zelle",
            Self::Dolares => "dolares",
        }
    }

    /// Rate kind whose sale rate prices this product.
    pub fn rate_kind(self) -> RateKind {
        match self {
            Self::Normal => RateKind::Actual,
            Self::Paypal => RateKind::Paypal,
            Self::Zelle => RateKind::Zelle,
            Self::Dolares => RateKind::Dolares,
        }
    }

    /// USD-denominated products stay out of the COP/Bs settlement.
    pub fn is_usd(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "normal" => Ok(Self::Normal),
            "paypal" => Ok(Self::Paypal),
            "zelle" => Ok(Self::Zelle),
            "dolares" => Ok(Self::Dolares),
            other => Err(EngineError::InvalidId(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorPaymentMethod {
    Efectivo,
    ConsignacionNequi,
    ConsignacionBancolombia,
}

impl VendorPaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Efectivo => "efectivo",
            Self::ConsignacionNequi => "consignacion_nequi",
            Self::ConsignacionBancolombia => "consignacion_bancolombia",
        }
    }
}

impl TryFrom<&str> for VendorPaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "efectivo" => Ok(Self::Efectivo),
            "consignacion_nequi" => Ok(Self::ConsignacionNequi),
            "consignacion_bancolombia" => Ok(Self::ConsignacionBancolombia),
            other => Err(EngineError::InvalidId(format!(
                "invalid vendor payment method: {other}"
            ))),
        }
    }
}

/// Beneficiary fields copied at creation time.
///
/// Later edits to the beneficiary record never reach this copy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiarySnapshot {
    pub full_name: String,
    pub document_id: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_type: Option<String>,
    pub phone: Option<String>,
    pub is_pago_movil: bool,
}

/// Amount requested by the customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "currency", content = "amount", rename_all = "snake_case")]
pub enum TransferAmount {
    /// Pesos to send; bolívars are derived.
    Cop(Decimal),
    /// Bolívars to deliver; pesos are derived.
    Bs(Decimal),
    /// Dollars for the PayPal/Zelle/Dólares products.
    Usd(Decimal),
}

/// Frozen amounts and rate of a new transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pricing {
    pub amount_cop: Option<Decimal>,
    pub amount_usd: Option<Decimal>,
    pub amount_bs: Decimal,
    pub sale_rate: Decimal,
}

/// Prices a transfer against `sale_rate` (the current quote of
/// `transaction_type.rate_kind()`, or a negotiated custom rate).
pub fn price_transfer(
    transaction_type: TransactionType,
    amount: TransferAmount,
    sale_rate: Decimal,
) -> ResultEngine<Pricing> {
    ensure_positive_rate(sale_rate, "sale_rate")?;

    match (transaction_type, amount) {
        (TransactionType::Normal, TransferAmount::Cop(cop)) => {
            ensure_positive(cop, "amount_cop")?;
            let amount_bs = Currency::Ves.round(cop_to_bs(cop, sale_rate)?);
            Ok(Pricing {
                amount_cop: Some(cop),
                amount_usd: None,
                amount_bs,
                sale_rate,
            })
        }
        (TransactionType::Normal, TransferAmount::Bs(bs)) => {
            ensure_positive(bs, "amount_bs")?;
            let amount_cop = Currency::Cop.round(bs_to_cop(bs, sale_rate));
            Ok(Pricing {
                amount_cop: Some(amount_cop),
                amount_usd: None,
                amount_bs: Currency::Ves.round(bs),
                sale_rate,
            })
        }
        (kind, TransferAmount::Usd(usd)) if kind.is_usd() => {
            ensure_positive(usd, "amount_usd")?;
            Ok(Pricing {
                amount_cop: None,
                amount_usd: Some(usd),
                amount_bs: Currency::Ves.round(usd_to_bs(usd, sale_rate)),
                sale_rate,
            })
        }
        (kind, _) => Err(EngineError::InvalidAmount(format!(
            "amount currency does not match transaction type {}",
            kind.as_str()
        ))),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub created_by: String,
    pub beneficiary: BeneficiarySnapshot,
    pub transaction_type: TransactionType,
    pub amount_cop: Option<Decimal>,
    pub amount_usd: Option<Decimal>,
    pub amount_bs: Decimal,
    pub sale_rate: Decimal,
    pub custom_rate_used: bool,
    pub purchase_rate: Option<Decimal>,
    pub is_purchase_rate_set: bool,
    pub purchase_rate_final: bool,
    pub status: TransactionStatus,
    pub vendor_payment_method: Option<VendorPaymentMethod>,
    pub bank_commission_percentage: Option<Decimal>,
    pub is_paid_to_venezuela: bool,
    pub paid_to_venezuela_at: Option<DateTime<Utc>>,
    pub is_commission_paid_to_vendor: bool,
    /// Blob-storage path of the customer's payment proof.
    pub client_proof: Option<String>,
    /// Blob-storage path of Venezuela's payout proof.
    pub venezuela_proof: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        created_by: String,
        beneficiary: BeneficiarySnapshot,
        transaction_type: TransactionType,
        pricing: Pricing,
        custom_rate_used: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_by,
            beneficiary,
            transaction_type,
            amount_cop: pricing.amount_cop,
            amount_usd: pricing.amount_usd,
            amount_bs: pricing.amount_bs,
            sale_rate: pricing.sale_rate,
            custom_rate_used,
            purchase_rate: None,
            is_purchase_rate_set: false,
            purchase_rate_final: false,
            status: TransactionStatus::Pendiente,
            vendor_payment_method: None,
            bank_commission_percentage: None,
            is_paid_to_venezuela: false,
            paid_to_venezuela_at: None,
            is_commission_paid_to_vendor: false,
            client_proof: None,
            venezuela_proof: None,
            notes: None,
            created_at,
            last_edited_at: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub created_by: String,
    pub beneficiary_full_name: String,
    pub beneficiary_document_id: String,
    pub beneficiary_bank_name: String,
    pub beneficiary_account_number: String,
    pub beneficiary_account_type: Option<String>,
    pub beneficiary_phone: Option<String>,
    pub beneficiary_is_pago_movil: bool,
    pub transaction_type: String,
    pub amount_cop: Option<String>,
    pub amount_usd: Option<String>,
    pub amount_bs: String,
    pub sale_rate: String,
    pub custom_rate_used: bool,
    pub purchase_rate: Option<String>,
    pub is_purchase_rate_set: bool,
    pub purchase_rate_final: bool,
    pub status: String,
    pub vendor_payment_method: Option<String>,
    pub bank_commission_percentage: Option<String>,
    pub is_paid_to_venezuela: bool,
    pub paid_to_venezuela_at: Option<DateTimeUtc>,
    pub is_commission_paid_to_vendor: bool,
    pub client_proof: Option<String>,
    pub venezuela_proof: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub last_edited_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::history::Entity")]
    History,
}

impl Related<super::history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            created_by: ActiveValue::Set(tx.created_by.clone()),
            beneficiary_full_name: ActiveValue::Set(tx.beneficiary.full_name.clone()),
            beneficiary_document_id: ActiveValue::Set(tx.beneficiary.document_id.clone()),
            beneficiary_bank_name: ActiveValue::Set(tx.beneficiary.bank_name.clone()),
            beneficiary_account_number: ActiveValue::Set(tx.beneficiary.account_number.clone()),
            beneficiary_account_type: ActiveValue::Set(tx.beneficiary.account_type.clone()),
            beneficiary_phone: ActiveValue::Set(tx.beneficiary.phone.clone()),
            beneficiary_is_pago_movil: ActiveValue::Set(tx.beneficiary.is_pago_movil),
            transaction_type: ActiveValue::Set(tx.transaction_type.as_str().to_string()),
            amount_cop: ActiveValue::Set(tx.amount_cop.map(decimal_to_db)),
            amount_usd: ActiveValue::Set(tx.amount_usd.map(decimal_to_db)),
            amount_bs: ActiveValue::Set(decimal_to_db(tx.amount_bs)),
            sale_rate: ActiveValue::Set(decimal_to_db(tx.sale_rate)),
            custom_rate_used: ActiveValue::Set(tx.custom_rate_used),
            purchase_rate: ActiveValue::Set(tx.purchase_rate.map(decimal_to_db)),
            is_purchase_rate_set: ActiveValue::Set(tx.is_purchase_rate_set),
            purchase_rate_final: ActiveValue::Set(tx.purchase_rate_final),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            vendor_payment_method: ActiveValue::Set(
                tx.vendor_payment_method.map(|m| m.as_str().to_string()),
            ),
            bank_commission_percentage: ActiveValue::Set(
                tx.bank_commission_percentage.map(decimal_to_db),
            ),
            is_paid_to_venezuela: ActiveValue::Set(tx.is_paid_to_venezuela),
            paid_to_venezuela_at: ActiveValue::Set(tx.paid_to_venezuela_at),
            is_commission_paid_to_vendor: ActiveValue::Set(tx.is_commission_paid_to_vendor),
            client_proof: ActiveValue::Set(tx.client_proof.clone()),
            venezuela_proof: ActiveValue::Set(tx.venezuela_proof.clone()),
            notes: ActiveValue::Set(tx.notes.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            last_edited_at: ActiveValue::Set(tx.last_edited_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            created_by: model.created_by,
            beneficiary: BeneficiarySnapshot {
                full_name: model.beneficiary_full_name,
                document_id: model.beneficiary_document_id,
                bank_name: model.beneficiary_bank_name,
                account_number: model.beneficiary_account_number,
                account_type: model.beneficiary_account_type,
                phone: model.beneficiary_phone,
                is_pago_movil: model.beneficiary_is_pago_movil,
            },
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            amount_cop: parse_optional_decimal(model.amount_cop.as_deref(), "amount_cop")?,
            amount_usd: parse_optional_decimal(model.amount_usd.as_deref(), "amount_usd")?,
            amount_bs: parse_decimal(&model.amount_bs, "amount_bs")?,
            sale_rate: parse_decimal(&model.sale_rate, "sale_rate")?,
            custom_rate_used: model.custom_rate_used,
            purchase_rate: parse_optional_decimal(model.purchase_rate.as_deref(), "purchase_rate")?,
            is_purchase_rate_set: model.is_purchase_rate_set,
            purchase_rate_final: model.purchase_rate_final,
            status: TransactionStatus::try_from(model.status.as_str())?,
            vendor_payment_method: model
                .vendor_payment_method
                .as_deref()
                .map(VendorPaymentMethod::try_from)
                .transpose()?,
            bank_commission_percentage: parse_optional_decimal(
                model.bank_commission_percentage.as_deref(),
                "bank_commission_percentage",
            )?,
            is_paid_to_venezuela: model.is_paid_to_venezuela,
            paid_to_venezuela_at: model.paid_to_venezuela_at,
            is_commission_paid_to_vendor: model.is_commission_paid_to_vendor,
            client_proof: model.client_proof,
            venezuela_proof: model.venezuela_proof,
            notes: model.notes,
            created_at: model.created_at,
            last_edited_at: model.last_edited_at,
        })
    }
}
