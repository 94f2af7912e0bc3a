use bigdecimal::BigDecimal;
use bigdecimal::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of minor units (cents) in one major unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Any amount at or above `10^MAX_MAJOR_DIGITS` major units overflows `i64` cents.
const MAX_MAJOR_DIGITS: i64 = 17;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount '{0}' does not fit in minor units")]
    Overflow(String),
    #[error("sum of minor units overflowed")]
    SumOverflow,
}

/// Normalize a monetary value to 2 decimal places (truncating; BigDecimal drops extra digits when reducing scale)
pub fn normalize_scale(value: &BigDecimal) -> BigDecimal {
    value.with_scale(2)
}

/// Convert a decimal amount into integer minor units.
///
/// Digits past the second decimal place are truncated toward zero, so
/// `19.999` becomes `1999`. Every boundary that needs cents (processor
/// calls, ledger reconciliation, revenue sums) goes through this one rule.
pub fn to_minor_units(value: &BigDecimal) -> Result<i64, MoneyError> {
    match magnitude(value) {
        Magnitude::Zero | Magnitude::BelowOneCent => return Ok(0),
        Magnitude::TooLarge => return Err(MoneyError::Overflow(compact(value))),
        Magnitude::InRange => {}
    }
    let scaled = (value.clone() * BigDecimal::from(MINOR_PER_MAJOR)).with_scale(0);
    scaled
        .to_i64()
        .ok_or_else(|| MoneyError::Overflow(value.to_string()))
}

/// Cheap magnitude check that never expands the exponent.
///
/// `false` means the amount certainly cannot be expressed in `i64` cents.
/// Run it before comparing or rescaling untrusted decimals: a short string
/// like `1e2000000` otherwise materialises a two-million-digit integer.
pub fn within_minor_range(value: &BigDecimal) -> bool {
    magnitude(value) != Magnitude::TooLarge
}

#[derive(Debug, PartialEq, Eq)]
enum Magnitude {
    Zero,
    BelowOneCent,
    InRange,
    TooLarge,
}

fn magnitude(value: &BigDecimal) -> Magnitude {
    let (digits, exponent) = value.as_bigint_and_exponent();
    let bits = digits.bits();
    if bits == 0 {
        return Magnitude::Zero;
    }
    // 2^(bits - 1) <= |digits| < 2^bits, and 0.30103 < log10(2) < 0.30104
    let min_log10 = ((bits - 1) as i128 * 30_103 / 100_000) as i64;
    let max_log10 = (bits as i128 * 30_104 / 100_000) as i64 + 1;
    if min_log10.saturating_sub(exponent) >= MAX_MAJOR_DIGITS {
        Magnitude::TooLarge
    } else if max_log10.saturating_sub(exponent) < -2 {
        Magnitude::BelowOneCent
    } else {
        Magnitude::InRange
    }
}

/// Scientific rendering that stays as short as the input.
fn compact(value: &BigDecimal) -> String {
    let (digits, exponent) = value.as_bigint_and_exponent();
    format!("{digits}e{}", exponent.saturating_neg())
}

/// Render integer minor units as a decimal with exactly two fractional digits.
pub fn from_minor_units(minor: i64) -> BigDecimal {
    normalize_scale(&(BigDecimal::from(minor) / BigDecimal::from(MINOR_PER_MAJOR)))
}

/// Checked reduction over minor-unit amounts.
pub fn sum_minor_units<I>(amounts: I) -> Result<i64, MoneyError>
where
    I: IntoIterator<Item = i64>,
{
    amounts
        .into_iter()
        .try_fold(0i64, |acc, amount| acc.checked_add(amount).ok_or(MoneyError::SumOverflow))
}

/// True when `minor` is what [`to_minor_units`] yields for `amount`.
pub fn reconciles(amount: &BigDecimal, minor: i64) -> bool {
    to_minor_units(amount).map(|expected| expected == minor).unwrap_or(false)
}

/// Compare two monetary values allowing a tolerance (in cents) after conversion to minor units.
pub fn nearly_equal(a: &BigDecimal, b: &BigDecimal, cents_tolerance: i64) -> bool {
    match (to_minor_units(a), to_minor_units(b)) {
        (Ok(a), Ok(b)) => (a - b).abs() <= cents_tolerance,
        _ => false,
    }
}

/// A decimal amount already cut to two fractional digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedMoney(BigDecimal);

impl NormalizedMoney {
    pub fn new(raw: BigDecimal) -> Self {
        Self(normalize_scale(&raw))
    }
    pub fn inner(&self) -> &BigDecimal { &self.0 }
    pub fn minor_units(&self) -> Result<i64, MoneyError> { to_minor_units(&self.0) }
}

impl From<BigDecimal> for NormalizedMoney {
    fn from(value: BigDecimal) -> Self { Self::new(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_scale(&dec("12.3456")).to_string(), "12.34");
    }

    #[test]
    fn to_minor_units_truncates_extra_digits() {
        assert_eq!(to_minor_units(&dec("42.50")).unwrap(), 4250);
        assert_eq!(to_minor_units(&dec("42.5")).unwrap(), 4250);
        assert_eq!(to_minor_units(&dec("19.999")).unwrap(), 1999);
        assert_eq!(to_minor_units(&dec("0.29")).unwrap(), 29);
        assert_eq!(to_minor_units(&dec("-1.015")).unwrap(), -101);
    }

    #[test]
    fn to_minor_units_rejects_overflow() {
        let huge = dec("92233720368547758.08");
        assert!(matches!(to_minor_units(&huge), Err(MoneyError::Overflow(_))));
    }

    #[test]
    fn huge_exponents_are_rejected_without_expansion() {
        let started = std::time::Instant::now();
        for raw in ["1e2000000", "-1e2000000", "123456789e999999"] {
            assert!(!within_minor_range(&dec(raw)), "{raw}");
            assert!(matches!(to_minor_units(&dec(raw)), Err(MoneyError::Overflow(_))));
        }
        assert!(started.elapsed() < std::time::Duration::from_millis(500));
    }

    #[test]
    fn range_check_keeps_ordinary_amounts() {
        for raw in ["0", "0e2000000", "42.50", "-19.999", "1e-2000000", "92233720368547758.07"] {
            assert!(within_minor_range(&dec(raw)), "{raw}");
        }
        assert_eq!(to_minor_units(&dec("1e7")).unwrap(), 1_000_000_000);
        assert_eq!(to_minor_units(&dec("92233720368547758.07")).unwrap(), i64::MAX);
        assert_eq!(to_minor_units(&dec("0.009")).unwrap(), 0);
        assert_eq!(to_minor_units(&dec("-0.01")).unwrap(), -1);
    }

    #[test]
    fn degenerate_exponents_stay_cheap() {
        let started = std::time::Instant::now();
        assert_eq!(to_minor_units(&dec("0e2000000")).unwrap(), 0);
        assert_eq!(to_minor_units(&dec("1e-2000000")).unwrap(), 0);
        assert_eq!(
            to_minor_units(&dec("1e2000000")),
            Err(MoneyError::Overflow("1e2000000".into()))
        );
        assert!(started.elapsed() < std::time::Duration::from_millis(500));
    }

    #[test]
    fn from_minor_units_has_two_places() {
        assert_eq!(from_minor_units(2500).to_string(), "25.00");
        assert_eq!(from_minor_units(4250).to_string(), "42.50");
        assert_eq!(from_minor_units(0), BigDecimal::from(0));
    }

    #[test]
    fn sum_detects_overflow() {
        assert_eq!(sum_minor_units([1000, 1500]), Ok(2500));
        assert_eq!(sum_minor_units(std::iter::empty()), Ok(0));
        assert_eq!(sum_minor_units([i64::MAX, 1]), Err(MoneyError::SumOverflow));
    }

    #[test]
    fn test_nearly_equal() {
        let a = dec("10.001");
        let b = dec("10.009");
        assert!(nearly_equal(&a, &b, 0));
        assert!(nearly_equal(&dec("10.00"), &dec("10.01"), 1));
        assert!(!nearly_equal(&dec("10.00"), &dec("10.02"), 1));
    }

    #[test]
    fn reconciles_uses_truncation_rule() {
        assert!(reconciles(&dec("42.50"), 4250));
        assert!(reconciles(&dec("9.999"), 999));
        assert!(!reconciles(&dec("9.999"), 1000));
    }

    #[test]
    fn normalized_money_reports_minor_units() {
        let money = NormalizedMoney::from(dec("3.14159"));
        assert_eq!(money.inner().to_string(), "3.14");
        assert_eq!(money.minor_units().unwrap(), 314);
    }
}
