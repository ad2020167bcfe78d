//! Vendor commissions.
//!
//! Vendors reporting to admin Colombia earn 2% of the COP amount. Vendors
//! reporting to admin Venezuela earn 5%, or 4% when they negotiated a custom
//! rate. USD products carry no COP amount and earn nothing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Role, Transaction, TransactionStatus};

/// Which admin a vendor reports to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorNetwork {
    Colombia,
    Venezuela,
}

impl VendorNetwork {
    /// Network of a vendor given the role of its `reports_to` user.
    ///
    /// Anything other than admin Venezuela falls back to the Colombia network.
    pub fn from_supervisor(role: Option<Role>) -> Self {
        match role {
            Some(Role::AdminVenezuela) => Self::Venezuela,
            _ => Self::Colombia,
        }
    }
}

pub fn commission_rate(network: VendorNetwork, custom_rate_used: bool) -> Decimal {
    match (network, custom_rate_used) {
        (VendorNetwork::Colombia, _) => dec!(0.02),
        (VendorNetwork::Venezuela, true) => dec!(0.04),
        (VendorNetwork::Venezuela, false) => dec!(0.05),
    }
}

/// Commission owed on `tx`, `None` when it earns none.
pub fn commission_for(tx: &Transaction, network: VendorNetwork) -> Option<Decimal> {
    if tx.status != TransactionStatus::Completado {
        return None;
    }
    let amount_cop = tx.amount_cop?;
    Some(amount_cop * commission_rate(network, tx.custom_rate_used))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionLine {
    pub transaction_id: Uuid,
    pub vendor_id: String,
    pub vendor_name: String,
    pub network: VendorNetwork,
    pub created_at: DateTime<Utc>,
    pub amount_cop: Decimal,
    pub custom_rate_used: bool,
    pub rate: Decimal,
    pub commission: Decimal,
    pub is_paid: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCommissionTotals {
    pub vendor_id: String,
    pub vendor_name: String,
    pub count: u64,
    pub total: Decimal,
    pub unpaid: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionReport {
    pub lines: Vec<CommissionLine>,
    /// Sorted by vendor id.
    pub vendors: Vec<VendorCommissionTotals>,
    pub total: Decimal,
    pub unpaid: Decimal,
}

impl CommissionReport {
    pub fn from_lines(lines: Vec<CommissionLine>) -> Self {
        let mut by_vendor: BTreeMap<String, VendorCommissionTotals> = BTreeMap::new();
        let mut total = Decimal::ZERO;
        let mut unpaid = Decimal::ZERO;
        for line in &lines {
            let entry = by_vendor
                .entry(line.vendor_id.clone())
                .or_insert_with(|| VendorCommissionTotals {
                    vendor_id: line.vendor_id.clone(),
                    vendor_name: line.vendor_name.clone(),
                    ..Default::default()
                });
            entry.count += 1;
            entry.total += line.commission;
            total += line.commission;
            if !line.is_paid {
                entry.unpaid += line.commission;
                unpaid += line.commission;
            }
        }
        Self {
            lines,
            vendors: by_vendor.into_values().collect(),
            total,
            unpaid,
        }
    }
}
