//! CSV exports of the reports.

use std::io::Write;

use csv::Writer;
use engine::{CommissionReport, DebtSummary};
use serde::Serialize;

#[derive(Serialize)]
struct DebtRow {
    transaction_id: String,
    created_at: String,
    vendor: String,
    beneficiary: String,
    amount_cop: String,
    amount_bs: String,
    purchase_rate: String,
    investment: String,
    system_profit: String,
    admin_venezuela_share: String,
    admin_colombia_share: String,
    debt_to_venezuela: String,
    paid_to_venezuela: bool,
}

#[derive(Serialize)]
struct CommissionRow {
    transaction_id: String,
    created_at: String,
    vendor_id: String,
    vendor_name: String,
    network: String,
    amount_cop: String,
    rate: String,
    commission: String,
    paid: bool,
}

pub fn write_debt_summary<W: Write>(
    summary: &DebtSummary,
    out: W,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut writer = Writer::from_writer(out);
    for line in &summary.lines {
        writer.serialize(DebtRow {
            transaction_id: line.transaction_id.to_string(),
            created_at: line.created_at.to_rfc3339(),
            vendor: line
                .vendor_name
                .clone()
                .unwrap_or_else(|| line.vendor_id.clone()),
            beneficiary: line.beneficiary_name.clone(),
            amount_cop: line.amount_cop.to_string(),
            amount_bs: line.amount_bs.to_string(),
            purchase_rate: line.purchase_rate.to_string(),
            investment: line.settlement.investment.to_string(),
            system_profit: line.settlement.system_profit.to_string(),
            admin_venezuela_share: line.settlement.admin_venezuela_share.to_string(),
            admin_colombia_share: line.settlement.admin_colombia_share.to_string(),
            debt_to_venezuela: line.settlement.debt_to_venezuela.to_string(),
            paid_to_venezuela: line.is_paid_to_venezuela,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_commissions<W: Write>(
    report: &CommissionReport,
    out: W,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut writer = Writer::from_writer(out);
    for line in &report.lines {
        writer.serialize(CommissionRow {
            transaction_id: line.transaction_id.to_string(),
            created_at: line.created_at.to_rfc3339(),
            vendor_id: line.vendor_id.clone(),
            vendor_name: line.vendor_name.clone(),
            network: format!("{:?}", line.network).to_lowercase(),
            amount_cop: line.amount_cop.to_string(),
            rate: line.rate.to_string(),
            commission: line.commission.to_string(),
            paid: line.is_paid,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use engine::{DebtLine, DebtSummary, Settlement, SettlementTotals, VenezuelaPayment};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn debt_summary_rows_carry_the_settlement() {
        let from = Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 4, 1, 5, 0, 0).unwrap();
        let settlement = Settlement::compute(dec!(500000), dec!(2342.15), dec!(210));
        let line = DebtLine {
            transaction_id: Uuid::nil(),
            created_at: from,
            vendor_id: "vendor-co".to_string(),
            vendor_name: None,
            beneficiary_name: "Maria Perez".to_string(),
            amount_cop: dec!(500000),
            amount_bs: dec!(2342.15),
            purchase_rate: dec!(210),
            is_paid_to_venezuela: false,
            settlement,
        };
        let payment =
            VenezuelaPayment::new(dec!(1000), from, None, None, "co".to_string(), from).unwrap();
        let summary = DebtSummary::new(
            from,
            to,
            SettlementTotals::default(),
            vec![line],
            vec![payment],
        );

        let mut out = Vec::new();
        write_debt_summary(&summary, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("transaction_id,created_at,vendor"));
        let row = lines.next().unwrap();
        assert!(row.contains("vendor-co,Maria Perez,500000,2342.15,210"));
        assert!(row.ends_with("495925.75,false"));
        assert_eq!(lines.next(), None);
    }
}
