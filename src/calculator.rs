use chrono::{Datelike, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde_json::Value;
use std::sync::Arc;

use crate::calendar::BusinessCalendar;
use crate::config::EngineConfig;
use crate::demand::{CreditDemand, DemandNormalizer};
use crate::engine::{AmortizationResult, SacEngine};
use crate::errors::{CreditError, Result};
use crate::events::Event;
use crate::schedule::ScheduleGenerator;
use crate::solver::GrossValueSolver;
use crate::types::BorrowerKind;

/// latest day of month suggested as an anchor, valid in every month
pub const MAX_SUGGESTED_ANCHOR_DAY: u32 = 28;

/// entry point owning the calendar and schedule caches
///
/// Caches live as long as the calculator and are shared by every
/// calculation run through it, including across threads.
pub struct SacCalculator {
    config: EngineConfig,
    schedules: ScheduleGenerator,
}

impl Default for SacCalculator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SacCalculator {
    pub fn new(config: EngineConfig) -> Self {
        let calendar = Arc::new(BusinessCalendar::new(&config.calendar, config.max_anchor_attempts));
        Self {
            config,
            schedules: ScheduleGenerator::new(calendar),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        self.schedules.calendar()
    }

    pub fn schedules(&self) -> &ScheduleGenerator {
        &self.schedules
    }

    pub fn normalizer<'a>(&'a self, borrower: BorrowerKind, time: &'a SafeTimeProvider) -> DemandNormalizer<'a> {
        DemandNormalizer::new(borrower, time, self.calendar())
    }

    /// run a demand, solving for the principal when only a net value is given
    pub fn calculate(&self, demand: &CreditDemand, time: &SafeTimeProvider) -> Result<AmortizationResult> {
        demand.validate()?;

        let engine = SacEngine::new(&self.schedules);
        let mut result = match (demand.target.principal, demand.target.net_value) {
            (Some(_), _) => engine.calculate(demand)?,
            (None, Some(_)) => GrossValueSolver::new(&engine, &self.config.solver).solve(demand)?,
            (None, None) => {
                return Err(CreditError::invalid_input("either a principal or a net value is required"))
            }
        };

        result.events.push(Event::CalculationCompleted {
            simulation_id: result.simulation_id,
            principal: result.principal,
            net_value: result.net_value,
            timestamp: time.now(),
        });

        tracing::debug!(
            simulation_id = %result.simulation_id,
            principal = %result.principal,
            net_value = %result.net_value,
            "calculation completed"
        );
        Ok(result)
    }

    /// normalize a loosely typed request and run it
    pub fn calculate_json(
        &self,
        input: &Value,
        borrower: BorrowerKind,
        time: &SafeTimeProvider,
    ) -> Result<AmortizationResult> {
        let demand = self.normalizer(borrower, time).normalize(input)?;
        self.calculate(&demand, time)
    }

    /// anchor day for a request that did not name one: the first business
    /// day on or after the operation date, kept within the 28th
    pub fn suggested_anchor_day(&self, operation_date: NaiveDate) -> Result<u32> {
        let date = self
            .calendar()
            .anchor_resolved_to_business_day(operation_date, MAX_SUGGESTED_ANCHOR_DAY)?;
        Ok(date.day())
    }
}
