use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::errors::{CreditError, Result};
use crate::types::ValueKind;

/// Money type, 8 internal decimal places, formatted with 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// prefix mark used by `format` and accepted by `parse`
    pub const MARK: &'static str = "$ ";
    /// decimals shown by `format` and accepted by `parse`
    pub const DECIMALS: u32 = 2;

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(8))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> std::result::Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(8)))
    }

    /// create from integer amount (reais)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (centavos with scale 2)
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        let d = Decimal::from(amount) / Decimal::from(10_u64.pow(scale));
        Money(d.round_dp(8))
    }

    /// parse a formatted amount such as `$ 1234.56` or `1234,56`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix(Self::MARK.trim_end())
            .map(str::trim_start)
            .unwrap_or(trimmed);

        parse_unsigned(body, Self::DECIMALS)
            .map(Money::from_decimal)
            .ok_or_else(|| CreditError::Parse {
                kind: ValueKind::Currency,
                input: input.to_string(),
            })
    }

    /// format with the currency mark and declared decimals
    pub fn format(&self) -> String {
        format!("{}{:.2}", Self::MARK, self.0)
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// absolute value
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// minimum of two values
    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    /// maximum of two values
    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// apply a rate to this amount (e.g. 1% of $100)
    pub fn apply(&self, rate: Rate) -> Self {
        Money((self.0 * rate.as_decimal()).round_dp(8))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = CreditError;

    fn from_str(s: &str) -> Result<Self> {
        Money::parse(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
    }
}

impl From<i32> for Money {
    fn from(i: i32) -> Self {
        Money::from_major(i as i64)
    }
}

impl From<u32> for Money {
    fn from(i: u32) -> Self {
        Money::from_major(i as i64)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(8))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(8);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(8))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(8);
    }
}

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(8))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(8))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// rate type for interest rates, fees and taxes, stored as a fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);
    pub const ONE: Rate = Rate(Decimal::ONE);

    /// suffix mark used by `format` and accepted by `parse`
    pub const MARK: &'static str = "%";
    /// decimals of the percentage shown by `format` and accepted by `parse`
    pub const DECIMALS: u32 = 6;

    /// create from decimal (e.g., 0.05 for 5%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 5 for 5%)
    pub fn from_percentage(p: u32) -> Self {
        Rate(Decimal::from(p) / Decimal::from(100))
    }

    /// create from basis points (e.g., 500 for 5%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(10000))
    }

    /// parse a percentage such as `2%`, `0,38%` or `1.5`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_suffix(Self::MARK)
            .map(str::trim_end)
            .unwrap_or(trimmed);

        parse_unsigned(body, Self::DECIMALS)
            .map(|pct| Rate(pct / Decimal::ONE_HUNDRED))
            .ok_or_else(|| CreditError::Parse {
                kind: ValueKind::Percent,
                input: input.to_string(),
            })
    }

    /// format as a percentage with the declared decimals
    pub fn format(&self) -> String {
        format!("{}{}", self.as_percentage().round_dp(Self::DECIMALS).normalize(), Self::MARK)
    }

    /// get as decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percentage
    pub fn as_percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    /// get as basis points
    pub fn as_bps(&self) -> Decimal {
        self.0 * Decimal::from(10000)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl FromStr for Rate {
    type Err = CreditError;

    fn from_str(s: &str) -> Result<Self> {
        Rate::parse(s)
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

impl Add for Rate {
    type Output = Rate;

    fn add(self, other: Rate) -> Rate {
        Rate(self.0 + other.0)
    }
}

/// digits with an optional `.`/`,` separator and at most `max_decimals` fraction digits
fn parse_unsigned(body: &str, max_decimals: u32) -> Option<Decimal> {
    let (int_part, frac_part) = match body.find(|c: char| c == '.' || c == ',') {
        Some(pos) => (&body[..pos], &body[pos + 1..]),
        None => (body, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    if frac_part.len() > max_decimals as usize {
        return None;
    }

    if frac_part.is_empty() {
        Decimal::from_str(int_part).ok()
    } else {
        Decimal::from_str(&format!("{}.{}", int_part, frac_part)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679"); // rounded to 8 places
    }

    #[test]
    fn test_money_parse_with_and_without_mark() {
        assert_eq!(Money::parse("$ 1234.56").unwrap(), Money::from_decimal(dec!(1234.56)));
        assert_eq!(Money::parse("1234,5").unwrap(), Money::from_decimal(dec!(1234.5)));
        assert_eq!(Money::parse("$1000").unwrap(), Money::from_major(1000));
        assert_eq!(Money::parse("  42. ").unwrap(), Money::from_major(42));
    }

    #[test]
    fn test_money_parse_rejects_malformed() {
        for bad in ["", "abc", "$ ", "12.345", "-5", "1.2.3", "R$ 10", "10%"] {
            let err = Money::parse(bad).unwrap_err();
            assert_eq!(
                err,
                CreditError::Parse { kind: ValueKind::Currency, input: bad.to_string() }
            );
        }
    }

    #[test]
    fn test_money_format_round_trips() {
        let m = Money::from_decimal(dec!(98765.4));
        assert_eq!(m.format(), "$ 98765.40");
        assert_eq!(Money::parse(&m.format()).unwrap(), m);
    }

    #[test]
    fn test_rate_parse_and_format() {
        assert_eq!(Rate::parse("2%").unwrap(), Rate::from_decimal(dec!(0.02)));
        assert_eq!(Rate::parse("0,38%").unwrap(), Rate::from_decimal(dec!(0.0038)));
        assert_eq!(Rate::parse("0.0082").unwrap(), Rate::from_decimal(dec!(0.000082)));
        assert!(Rate::parse("2%%").is_err());
        assert!(Rate::parse("x%").is_err());

        let iof = Rate::from_decimal(dec!(0.0000559));
        assert_eq!(iof.format(), "0.00559%");
        assert_eq!(Rate::parse(&iof.format()).unwrap(), iof);
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let m = Money::from_decimal(dec!(8333.33333333));
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let r = Rate::from_decimal(dec!(0.0000559));
        let back: Rate = serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_apply_rate_and_sum() {
        let principal = Money::from_major(10_000);
        assert_eq!(principal.apply(Rate::from_percentage(1)), Money::from_major(100));

        let total: Money = vec![Money::from_major(1), Money::CENT, Money::CENT].into_iter().sum();
        assert_eq!(total, Money::from_decimal(dec!(1.02)));
    }
}
