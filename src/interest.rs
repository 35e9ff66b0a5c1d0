use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};

/// days per month used to turn a monthly rate into a daily one
pub const DAYS_PER_MONTH: u32 = 30;

/// daily rate from a monthly rate, 30 day month
pub fn daily_rate(monthly: Rate) -> Rate {
    Rate::from_decimal(monthly.as_decimal() / Decimal::from(DAYS_PER_MONTH))
}

/// simple interest on a balance for a number of days
pub fn simple_interest(balance: Money, daily: Rate, days: u32) -> Money {
    Money::from_decimal(balance.as_decimal() * daily.as_decimal() * Decimal::from(days))
}

/// sum of `(1 + rate)^d` for `d` in `0..days`, i.e. `((1 + rate)^days - 1) / rate`
pub fn accumulation_factor(rate: Rate, days: u32) -> Result<Decimal> {
    let r = rate.as_decimal();
    if r.is_zero() {
        return Ok(Decimal::from(days));
    }

    let growth = (Decimal::ONE + r)
        .checked_powu(days as u64)
        .ok_or_else(|| CreditError::calculation(format!("(1 + {})^{} overflowed", r, days)))?;

    Ok((growth - Decimal::ONE) / r)
}
