use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, ResultEngine};

/// Max fraction digits accepted for exchange rates (`decimal(10,4)` upstream).
pub const RATE_SCALE: u32 = 4;

/// A decimal amount tagged with its currency.
///
/// Use this type when an amount leaves the engine for humans (CLI output,
/// exports). Internally the engine works on plain `Decimal`s whose currency
/// is implied by the field name (`amount_cop`, `amount_bs`, ...).
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
/// use rust_decimal::Decimal;
///
/// let amount = Money::new(Decimal::new(50_000_050, 2), Currency::Cop);
/// assert_eq!(amount.to_string(), "500.000,50 COP");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more fraction digits than the currency has):
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::parse("10,5", Currency::Ves).unwrap().amount().to_string(), "10.5");
/// assert!(Money::parse("12.345", Currency::Cop).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.amount
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Parses user input into an amount of `currency`.
    pub fn parse(input: &str, currency: Currency) -> ResultEngine<Self> {
        let amount = parse_decimal_input(input, currency.minor_units())?;
        Ok(Self { amount, currency })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.currency.round(self.amount);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let fixed = format!(
            "{:.*}",
            self.currency.minor_units() as usize,
            rounded.abs()
        );
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        if frac_part.is_empty() {
            write!(f, "{sign}{grouped} {}", self.currency)
        } else {
            write!(f, "{sign}{grouped},{frac_part} {}", self.currency)
        }
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a COP amount. Use [`Money::parse`] for other currencies.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, Currency::Cop)
    }
}

/// Parses a decimal typed by a human.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
///
/// Validation rules:
/// - at most `max_scale` fractional digits
/// - no thousands separators, no exponent
/// - rejects empty/invalid strings
pub fn parse_decimal_input(input: &str, max_scale: u32) -> ResultEngine<Decimal> {
    let invalid = || EngineError::InvalidAmount(format!("invalid amount: {input:?}"));

    let trimmed = input.trim();
    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped.trim_start())
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped.trim_start())
    } else {
        (false, trimmed)
    };
    if rest.is_empty() {
        return Err(EngineError::InvalidAmount("empty amount".to_string()));
    }

    let normalized = rest.replace(',', ".");
    let mut parts = normalized.split('.');
    let int_part = parts.next().ok_or_else(invalid)?;
    let frac_part = parts.next();
    if parts.next().is_some() {
        return Err(invalid());
    }

    if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if let Some(frac) = frac_part {
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() as u32 > max_scale {
            return Err(EngineError::InvalidAmount(format!(
                "too many decimals (max {max_scale})"
            )));
        }
    }

    let mut value = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    if negative {
        value = -value;
    }
    Ok(value)
}
