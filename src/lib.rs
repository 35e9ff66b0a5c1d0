pub mod calculator;
pub mod calendar;
pub mod config;
pub mod costs;
pub mod decimal;
pub mod demand;
pub mod engine;
pub mod errors;
pub mod events;
pub mod interest;
pub mod schedule;
pub mod serialization;
pub mod solver;
pub mod types;

// re-export key types
pub use calculator::SacCalculator;
pub use calendar::BusinessCalendar;
pub use config::{CalendarConfig, EngineConfig, IofConfig, SolverConfig};
pub use costs::{compute_cost, limit_to_cap, CostSpec};
pub use decimal::{Money, Rate};
pub use demand::{CreditDemand, CreditDemandBuilder, CreditTarget, DemandNormalizer};
pub use engine::{AmortizationResult, CostsSummary, InstallmentRecord, IofSummary, ResultTotals, SacEngine};
pub use errors::{CreditError, Result};
pub use events::{Event, EventStore};
pub use schedule::{DueDate, Schedule, ScheduleGenerator, ScheduleKey};
pub use serialization::{ResultView, FIELD_KINDS};
pub use solver::GrossValueSolver;
pub use types::{AmortizationEntry, AmortizationSystem, Amount, BorrowerKind, SimulationId, ValueKind};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
