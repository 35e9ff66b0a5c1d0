use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::events::{Event, EventStore};
use crate::interest::accumulation_factor;

/// IOF totals for one calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IofSummary {
    /// accrued over the schedule
    pub daily: Money,
    /// one-time charge on the principal
    pub additional: Money,
    pub total: Money,
    /// cap in currency, when one applies
    pub cap: Option<Money>,
    pub cap_reached: bool,
}

/// running daily IOF accrual against an optional cap
///
/// Once the running total touches the cap, accrual stops for the rest of
/// the schedule.
#[derive(Debug, Clone)]
pub struct IofAccrual {
    daily_rate: Rate,
    additional: Money,
    accrued: Money,
    cap: Option<Money>,
    cap_reached: bool,
}

impl IofAccrual {
    /// `additional` seeds the running total
    pub fn new(daily_rate: Rate, additional: Money, cap: Option<Money>) -> Self {
        let cap_reached = matches!(cap, Some(limit) if additional >= limit);
        Self {
            daily_rate,
            additional,
            accrued: Money::ZERO,
            cap,
            cap_reached,
        }
    }

    pub fn total(&self) -> Money {
        self.additional + self.accrued
    }

    pub fn cap_reached(&self) -> bool {
        self.cap_reached
    }

    /// IOF for one installment period on `balance`
    ///
    /// `interest_rate` is the daily interest rate compounding the base over
    /// `days`.
    pub fn accrue(
        &mut self,
        installment: u32,
        balance: Money,
        interest_rate: Rate,
        days: u32,
        events: &mut EventStore,
    ) -> Result<Money> {
        if self.cap_reached || days == 0 || self.daily_rate.is_zero() || !balance.is_positive() {
            return Ok(Money::ZERO);
        }

        let factor = accumulation_factor(interest_rate, days)?;
        let raw = Money::from_decimal(balance.as_decimal() * self.daily_rate.as_decimal() * factor);

        let amount = match self.cap {
            Some(limit) if self.total() + raw >= limit => {
                let residual = (limit - self.total()).max(Money::ZERO);
                self.cap_reached = true;
                tracing::warn!(installment, %limit, "iof cap reached");
                events.emit(Event::IofCapReached {
                    installment,
                    accrued: self.total() + residual,
                    cap: limit,
                });
                residual
            }
            _ => raw,
        };

        self.accrued += amount;
        Ok(amount)
    }

    pub fn summary(&self) -> IofSummary {
        IofSummary {
            daily: self.accrued,
            additional: self.additional,
            total: self.total(),
            cap: self.cap,
            cap_reached: self.cap_reached,
        }
    }
}
