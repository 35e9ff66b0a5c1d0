use rust_decimal::Decimal;

use crate::config::SolverConfig;
use crate::decimal::Money;
use crate::demand::CreditDemand;
use crate::engine::{AmortizationResult, SacEngine};
use crate::errors::{CreditError, Result};
use crate::events::{Event, EventStore};

/// finds the principal whose net value after costs hits a target
///
/// Damped bisection: each miss moves the violated bound past the midpoint by
/// a margin proportional to the relative error, clamped to the configured
/// range.
pub struct GrossValueSolver<'a> {
    engine: &'a SacEngine<'a>,
    config: &'a SolverConfig,
}

impl<'a> GrossValueSolver<'a> {
    pub fn new(engine: &'a SacEngine<'a>, config: &'a SolverConfig) -> Self {
        Self { engine, config }
    }

    /// first guess: the target grossed up by every cost rate
    pub fn initial_estimate(&self, demand: &CreditDemand, target: Money) -> Money {
        let rates = demand.flat.value.as_rate_of(target)
            + demand.iof.daily
            + demand.tac.value.as_rate_of(target)
            + demand.iof.additional;
        target * (Decimal::ONE + rates.as_decimal())
    }

    pub fn solve(&self, demand: &CreditDemand) -> Result<AmortizationResult> {
        let target = demand
            .target
            .net_value
            .ok_or_else(|| CreditError::invalid_input("a net value is required to solve for the principal"))?;
        if !target.is_positive() {
            return Err(CreditError::invalid_input(format!("net value must be positive, got {}", target)));
        }

        let estimate = self.initial_estimate(demand, target);
        let mut low = estimate * (Decimal::ONE - self.config.bracket);
        let mut high = estimate * (Decimal::ONE + self.config.bracket);
        let mut last_error = Money::ZERO;
        let mut events = EventStore::new();

        for iteration in 1..=self.config.max_iterations {
            let mid = (low + high) / Decimal::TWO;
            let mut result = self.engine.calculate_with_principal(demand, mid)?;

            let error = result.net_value - target;
            let tolerance = self.config.fixed_tolerance.max(mid * self.config.relative_tolerance);
            last_error = error;

            tracing::trace!(iteration, %mid, %error, %tolerance, "solver iteration");
            events.emit(Event::SolverIteration {
                iteration,
                candidate: mid,
                net_value: result.net_value,
                error,
            });

            if error.abs() < tolerance {
                tracing::debug!(iteration, gross = %mid, net = %result.net_value, "solver converged");
                events.emit(Event::SolverConverged {
                    net_target: target,
                    gross_value: mid,
                    iterations: iteration,
                });
                result.events.extend(events.take_events());
                return Ok(result);
            }

            let margin = (error.as_decimal() / target.as_decimal())
                .abs()
                .clamp(self.config.min_margin, self.config.max_margin);
            if error.is_positive() {
                high = mid - mid * margin;
            } else {
                low = mid + mid * margin;
            }
        }

        tracing::warn!(%target, %last_error, "solver did not converge");
        Err(CreditError::Convergence {
            target,
            iterations: self.config.max_iterations,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::BusinessCalendar;
    use crate::config::IofConfig;
    use crate::costs::CostSpec;
    use crate::decimal::Rate;
    use crate::demand::CreditTarget;
    use crate::schedule::ScheduleGenerator;
    use crate::types::{AmortizationSystem, Amount, BorrowerKind};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn demand(net: i64) -> CreditDemand {
        CreditDemand {
            target: CreditTarget::net_value(Money::from_major(net)),
            operation_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            anchor_day: 10,
            term: 12,
            grace_days: 0,
            monthly_rate: Rate::from_percentage(2),
            tac: CostSpec::new(Amount::percent(Rate::from_percentage(1))),
            flat: CostSpec::new(Amount::percent(Rate::from_percentage(1))),
            iof: IofConfig::company(),
            system: AmortizationSystem::Sac,
            interest_during_grace: false,
            simplified_regime: false,
            borrower: BorrowerKind::Company,
        }
    }

    #[test]
    fn test_solves_for_gross_value() {
        let gen = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let engine = SacEngine::new(&gen);
        let config = SolverConfig::default();
        let solver = GrossValueSolver::new(&engine, &config);

        let result = solver.solve(&demand(100_000)).unwrap();
        assert!(result.principal > Money::from_major(100_000));

        let tolerance = Money::CENT.max(result.principal * config.relative_tolerance);
        assert!((result.net_value - Money::from_major(100_000)).abs() < tolerance);
        assert_eq!(result.demand.target.net_value, Some(Money::from_major(100_000)));
        assert_eq!(result.demand.target.principal, Some(result.principal));
        assert!(result.events.iter().any(|e| matches!(e, Event::SolverConverged { .. })));
    }

    #[test]
    fn test_initial_estimate_uses_cost_rates() {
        let gen = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let engine = SacEngine::new(&gen);
        let config = SolverConfig::default();
        let solver = GrossValueSolver::new(&engine, &config);

        let mut d = demand(10_000);
        d.iof = IofConfig::exempt();
        d.tac = CostSpec::new(Amount::currency(Money::from_major(200)));
        // 10_000 * (1 + 0.01 + 0.02)
        assert_eq!(solver.initial_estimate(&d, Money::from_major(10_000)), Money::from_major(10_300));
    }

    #[test]
    fn test_exhaustion_is_a_convergence_error() {
        let gen = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let engine = SacEngine::new(&gen);
        let config = SolverConfig {
            max_iterations: 1,
            bracket: rust_decimal_macros::dec!(0.5),
            ..SolverConfig::default()
        };
        let solver = GrossValueSolver::new(&engine, &config);

        // the tac alone exceeds the bracket, the first midpoint misses badly
        let mut d = demand(100_000);
        d.tac = CostSpec::new(Amount::percent(Rate::from_percentage(40)));
        match solver.solve(&d) {
            Err(CreditError::Convergence { target, iterations, last_error }) => {
                assert_eq!(target, Money::from_major(100_000));
                assert_eq!(iterations, 1);
                assert!(!last_error.is_zero());
            }
            other => panic!("expected a convergence error, got {:?}", other),
        }
    }

    #[test]
    fn test_requires_net_value() {
        let gen = ScheduleGenerator::new(Arc::new(BusinessCalendar::default()));
        let engine = SacEngine::new(&gen);
        let config = SolverConfig::default();
        let solver = GrossValueSolver::new(&engine, &config);

        let mut d = demand(1_000);
        d.target = CreditTarget::principal(Money::from_major(1_000));
        assert!(matches!(solver.solve(&d), Err(CreditError::InvalidInput { .. })));
    }
}
