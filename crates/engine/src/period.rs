//! Reporting periods.
//!
//! Periods are calendar days in Bogotá and resolve to a half-open UTC range
//! `[from, to)`.

use chrono::{DateTime, Datelike as _, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::{America::Bogota, Tz};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

pub const BUSINESS_TZ: Tz = Bogota;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> ResultEngine<Self> {
        if from >= to {
            return Err(EngineError::InvalidAmount(
                "invalid range: from must be < to".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "period")]
pub enum DebtPeriod {
    Today,
    /// Today and the 14 days before it.
    Last15Days,
    ThisMonth,
    /// Both dates inclusive.
    Custom { start: NaiveDate, end: NaiveDate },
}

impl DebtPeriod {
    pub fn resolve(self, now: DateTime<Utc>) -> ResultEngine<DateRange> {
        let today = now.with_timezone(&BUSINESS_TZ).date_naive();
        let (first, last) = match self {
            Self::Today => (today, today),
            Self::Last15Days => (sub_days(today, 14)?, today),
            Self::ThisMonth => {
                let first = today
                    .with_day0(0)
                    .ok_or_else(|| invalid_date("month start"))?;
                let next = first
                    .checked_add_months(Months::new(1))
                    .ok_or_else(|| invalid_date("month end"))?;
                (first, sub_days(next, 1)?)
            }
            Self::Custom { start, end } => {
                if start > end {
                    return Err(EngineError::InvalidAmount(format!(
                        "invalid period: {start} is after {end}"
                    )));
                }
                (start, end)
            }
        };
        let after_last = last
            .checked_add_days(Days::new(1))
            .ok_or_else(|| invalid_date("period end"))?;
        DateRange::new(local_midnight(first)?, local_midnight(after_last)?)
    }
}

impl TryFrom<&str> for DebtPeriod {
    type Error = EngineError;

    /// Parses `today`, `last15days`, `this_month` or `YYYY-MM-DD..YYYY-MM-DD`.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "today" => Ok(Self::Today),
            "last15days" | "last_15_days" => Ok(Self::Last15Days),
            "this_month" | "thismonth" => Ok(Self::ThisMonth),
            custom => {
                let (start, end) = custom
                    .split_once("..")
                    .ok_or_else(|| invalid_date(custom))?;
                let parse = |s: &str| {
                    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| invalid_date(s))
                };
                Ok(Self::Custom {
                    start: parse(start)?,
                    end: parse(end)?,
                })
            }
        }
    }
}

fn sub_days(date: NaiveDate, days: u64) -> ResultEngine<NaiveDate> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| invalid_date("period start"))
}

fn local_midnight(date: NaiveDate) -> ResultEngine<DateTime<Utc>> {
    BUSINESS_TZ
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| invalid_date(&date.to_string()))
}

fn invalid_date(what: &str) -> EngineError {
    EngineError::InvalidAmount(format!("invalid date: {what}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn today_follows_bogota_calendar() {
        // 22:00 on March 9th in Bogotá.
        let now = utc("2026-03-10T03:00:00Z");
        let range = DebtPeriod::Today.resolve(now).unwrap();
        assert_eq!(range.from, utc("2026-03-09T05:00:00Z"));
        assert_eq!(range.to, utc("2026-03-10T05:00:00Z"));
        assert!(range.contains(now));
    }

    #[test]
    fn last_15_days_includes_today() {
        let range = DebtPeriod::Last15Days
            .resolve(utc("2026-03-20T15:00:00Z"))
            .unwrap();
        assert_eq!(range.from, utc("2026-03-06T05:00:00Z"));
        assert_eq!(range.to, utc("2026-03-21T05:00:00Z"));
    }

    #[test]
    fn this_month_is_the_whole_month() {
        let range = DebtPeriod::ThisMonth
            .resolve(utc("2026-02-14T12:00:00Z"))
            .unwrap();
        assert_eq!(range.from, utc("2026-02-01T05:00:00Z"));
        assert_eq!(range.to, utc("2026-03-01T05:00:00Z"));
    }

    #[test]
    fn custom_period_is_inclusive_and_ordered() {
        let period = DebtPeriod::try_from("2026-01-01..2026-01-31").unwrap();
        let range = period.resolve(Utc::now()).unwrap();
        assert_eq!(range.from, utc("2026-01-01T05:00:00Z"));
        assert_eq!(range.to, utc("2026-02-01T05:00:00Z"));

        assert!(DebtPeriod::try_from("2026-02-01..2026-01-01")
            .unwrap()
            .resolve(Utc::now())
            .is_err());
        assert!(DebtPeriod::try_from("yesterday").is_err());
    }
}
