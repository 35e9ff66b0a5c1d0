use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for one engine run
pub type SimulationId = Uuid;

/// kind of a monetary field, used when reading loosely typed input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Percent,
    Currency,
    Date,
    Integer,
    Flag,
}

/// an amount expressed either relative to the principal or in currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Amount {
    Percent(Rate),
    Currency(Money),
}

impl Amount {
    pub fn percent(rate: Rate) -> Self {
        Amount::Percent(rate)
    }

    pub fn currency(money: Money) -> Self {
        Amount::Currency(money)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Amount::Percent(_) => ValueKind::Percent,
            Amount::Currency(_) => ValueKind::Currency,
        }
    }

    /// resolve to currency against a principal
    pub fn resolve(&self, principal: Money) -> Money {
        match self {
            Amount::Percent(rate) => principal.apply(*rate),
            Amount::Currency(money) => *money,
        }
    }

    /// express as a rate relative to a reference amount
    pub fn as_rate_of(&self, reference: Money) -> Rate {
        match self {
            Amount::Percent(rate) => *rate,
            Amount::Currency(money) if reference.is_positive() => {
                Rate::from_decimal(money.as_decimal() / reference.as_decimal())
            }
            Amount::Currency(_) => Rate::ZERO,
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Percent(Rate::ZERO)
    }
}

/// amortization system requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AmortizationSystem {
    /// constant amortization (SAC)
    #[default]
    Sac,
    /// french system, equal payments
    Price,
}

/// borrower category, selects the IOF parameter table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BorrowerKind {
    /// pessoa física
    Individual,
    /// pessoa jurídica
    #[default]
    Company,
}

/// compact view of an amortization column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationEntry {
    /// amount written out
    Explicit(Money),
    /// same amount as the first amortizing installment
    Repeated,
}
