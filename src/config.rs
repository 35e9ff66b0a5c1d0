use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};
use crate::types::{Amount, BorrowerKind};

/// engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub calendar: CalendarConfig,
    pub solver: SolverConfig,
    /// guard for business day anchor resolution
    pub max_anchor_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calendar: CalendarConfig::default(),
            solver: SolverConfig::default(),
            max_anchor_attempts: 100,
        }
    }
}

impl EngineConfig {
    /// load from a json document, missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CreditError::invalid_input(format!("engine config: {}", e)))
    }
}

/// calendar configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CalendarConfig {
    /// additional fixed (month, day) holidays observed every year
    pub extra_holidays: Vec<(u32, u32)>,
}

/// gross value solver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    /// absolute tolerance on the net value
    pub fixed_tolerance: Money,
    /// tolerance relative to the candidate principal
    pub relative_tolerance: Decimal,
    pub max_iterations: u32,
    /// half width of the initial bracket around the estimate
    pub bracket: Decimal,
    pub min_margin: Decimal,
    pub max_margin: Decimal,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            fixed_tolerance: Money::CENT,
            relative_tolerance: dec!(0.0001),
            max_iterations: 100,
            bracket: dec!(0.1),
            min_margin: dec!(0.005),
            max_margin: dec!(0.1),
        }
    }
}

/// IOF parameters, all rates as fractions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IofConfig {
    /// rate accrued per day on the outstanding balance
    pub daily: Rate,
    /// one-time rate on the principal
    pub additional: Rate,
    /// ceiling for daily + additional
    pub cap: Option<Amount>,
}

const SIMPLIFIED_REGIME_THRESHOLD: i64 = 30_000;

impl IofConfig {
    /// pessoa física
    pub fn individual() -> Self {
        Self {
            daily: Rate::from_decimal(dec!(0.000082)),
            additional: Rate::from_decimal(dec!(0.0038)),
            cap: Some(Amount::Percent(Rate::from_percentage(3))),
        }
    }

    /// pessoa jurídica
    pub fn company() -> Self {
        Self {
            daily: Rate::from_decimal(dec!(0.0000559)),
            additional: Rate::from_decimal(dec!(0.0038)),
            cap: Some(Amount::Percent(Rate::from_decimal(dec!(0.015)))),
        }
    }

    /// pessoa jurídica under the simplified tax regime
    pub fn simplified(reference_amount: Money) -> Self {
        let daily = if reference_amount <= Money::from_major(SIMPLIFIED_REGIME_THRESHOLD) {
            dec!(0.0000137)
        } else {
            dec!(0.0000559)
        };

        Self {
            daily: Rate::from_decimal(daily),
            ..Self::company()
        }
    }

    /// no tax at all
    pub fn exempt() -> Self {
        Self {
            daily: Rate::ZERO,
            additional: Rate::ZERO,
            cap: None,
        }
    }

    /// pick the parameter table for a borrower
    pub fn for_borrower(kind: BorrowerKind, simplified: bool, reference_amount: Money) -> Self {
        match (kind, simplified) {
            (BorrowerKind::Individual, _) => Self::individual(),
            (BorrowerKind::Company, true) => Self::simplified(reference_amount),
            (BorrowerKind::Company, false) => Self::company(),
        }
    }
}
