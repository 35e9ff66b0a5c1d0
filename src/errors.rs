use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::Money;
use crate::types::ValueKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CreditError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("invalid {kind:?} value: '{input}'")]
    Parse {
        kind: ValueKind,
        input: String,
    },

    #[error("business day resolution did not settle from {date} after {attempts} attempts")]
    CalendarLoop {
        date: NaiveDate,
        attempts: u32,
    },

    #[error("gross value did not converge for net target {target} after {iterations} iterations (last error {last_error})")]
    Convergence {
        target: Money,
        iterations: u32,
        last_error: Money,
    },

    #[error("calculation error: {message}")]
    Calculation {
        message: String,
    },
}

impl CreditError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CreditError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn calculation(message: impl Into<String>) -> Self {
        CreditError::Calculation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CreditError>;
