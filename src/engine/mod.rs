pub mod iof;

pub use iof::{IofAccrual, IofSummary};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::costs::{compute_cost, CostSpec};
use crate::decimal::Money;
use crate::demand::CreditDemand;
use crate::errors::{CreditError, Result};
use crate::events::{Event, EventStore};
use crate::interest::{daily_rate, simple_interest};
use crate::schedule::{DueDate, Schedule, ScheduleGenerator};
use crate::types::{AmortizationEntry, AmortizationSystem, Amount, SimulationId};

/// one row of the amortization table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentRecord {
    /// 0 for the seed row at the operation date
    pub number: u32,
    pub due_date: NaiveDate,
    pub days_since_operation: u32,
    /// days since the previous row
    pub period_days: u32,
    pub in_grace: bool,
    pub amortization: Money,
    pub interest: Money,
    pub payment: Money,
    /// outstanding balance after this payment
    pub balance: Money,
    pub iof: Money,
}

/// aggregates over the installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResultTotals {
    pub total_paid: Money,
    pub total_interest: Money,
    pub total_amortization: Money,
    /// paid on top of the principal
    pub extra_paid: Money,
    pub largest_payment: Money,
    pub smallest_payment: Money,
}

/// upfront costs deducted from the principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CostsSummary {
    pub tac: Money,
    pub flat: Money,
    pub iof: IofSummary,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub simulation_id: SimulationId,
    pub demand: CreditDemand,
    pub principal: Money,
    pub net_value: Money,
    pub records: Vec<InstallmentRecord>,
    pub totals: ResultTotals,
    pub costs: CostsSummary,
    pub first_due: NaiveDate,
    pub last_due: NaiveDate,
    /// business days from the operation date to the last due date
    pub business_days: u32,
    pub events: Vec<Event>,
}

impl AmortizationResult {
    /// installments after the seed row
    pub fn installments(&self) -> &[InstallmentRecord] {
        self.records.get(1..).unwrap_or(&[])
    }

    pub fn final_balance(&self) -> Money {
        self.records.last().map(|r| r.balance).unwrap_or(self.principal)
    }

    /// amortization column with repeats of the first amortizing amount folded
    pub fn compact_amortizations(&self) -> Vec<AmortizationEntry> {
        let mut first: Option<Money> = None;
        self.records
            .iter()
            .map(|record| {
                if record.number == 0 || record.in_grace {
                    return AmortizationEntry::Explicit(record.amortization);
                }
                match first {
                    Some(amount) if amount == record.amortization => AmortizationEntry::Repeated,
                    Some(_) => AmortizationEntry::Explicit(record.amortization),
                    None => {
                        first = Some(record.amortization);
                        AmortizationEntry::Explicit(record.amortization)
                    }
                }
            })
            .collect()
    }
}

/// constant amortization engine for a known principal
pub struct SacEngine<'a> {
    schedules: &'a ScheduleGenerator,
}

impl<'a> SacEngine<'a> {
    pub fn new(schedules: &'a ScheduleGenerator) -> Self {
        Self { schedules }
    }

    /// run with the principal on the demand
    pub fn calculate(&self, demand: &CreditDemand) -> Result<AmortizationResult> {
        let principal = demand.target.principal.ok_or_else(|| {
            CreditError::invalid_input("a principal is required, solve for it from the net value first")
        })?;
        self.calculate_with_principal(demand, principal)
    }

    pub fn calculate_with_principal(&self, demand: &CreditDemand, principal: Money) -> Result<AmortizationResult> {
        if demand.system == AmortizationSystem::Price {
            return Err(CreditError::invalid_input("only the SAC amortization system is supported"));
        }
        if !principal.is_positive() {
            return Err(CreditError::invalid_input(format!("principal must be positive, got {}", principal)));
        }
        if demand.term == 0 {
            return Err(CreditError::invalid_input("term must be at least one installment"));
        }

        let schedule = self.schedules.generate(demand.schedule_key())?;
        if schedule.len() != demand.term as usize + 1 {
            return Err(CreditError::invalid_input(format!(
                "schedule has {} installments for a term of {}",
                schedule.installments().len(),
                demand.term
            )));
        }

        let (first_due, last_due) = match (schedule.first_due(), schedule.last_due()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(CreditError::invalid_input("schedule has no installments")),
        };

        let mut events = EventStore::new();
        events.emit(Event::ScheduleGenerated {
            installments: demand.term,
            first_due,
            last_due,
            from_cache: schedule.from_cache,
        });

        let additional_spec = CostSpec {
            value: Amount::Percent(demand.iof.additional),
            cap: demand.iof.cap,
        };
        let additional = compute_cost(principal, &additional_spec, "iof_additional", &mut events);
        let iof_cap = demand.iof.cap.map(|cap| cap.resolve(principal));
        let mut iof = IofAccrual::new(demand.iof.daily, additional, iof_cap);

        let records = self.walk(demand, principal, &schedule, &mut iof, &mut events)?;
        let totals = totals(principal, &records);

        let tac = compute_cost(principal, &demand.tac, "tac", &mut events);
        let flat = compute_cost(principal, &demand.flat, "flat", &mut events);
        let iof = iof.summary();
        let total_cost = tac + flat + iof.total;
        let net_value = principal - total_cost;

        let business_days = self
            .schedules
            .calendar()
            .business_days_between(demand.operation_date, last_due);

        tracing::debug!(%principal, %net_value, %total_cost, "sac schedule computed");

        Ok(AmortizationResult {
            simulation_id: uuid::Uuid::new_v4(),
            demand: demand.with_principal(principal),
            principal,
            net_value,
            records,
            totals,
            costs: CostsSummary {
                tac,
                flat,
                iof,
                total: total_cost,
            },
            first_due,
            last_due,
            business_days,
            events: events.take_events(),
        })
    }

    fn walk(
        &self,
        demand: &CreditDemand,
        principal: Money,
        schedule: &Schedule,
        iof: &mut IofAccrual,
        events: &mut EventStore,
    ) -> Result<Vec<InstallmentRecord>> {
        let installments = schedule.installments();
        let last = installments.len().saturating_sub(1);
        let in_grace = |index: usize, due: &DueDate| index < last && due.days_since_operation <= demand.grace_days;

        let amortizing = installments
            .iter()
            .enumerate()
            .filter(|(index, due)| !in_grace(*index, *due))
            .count();
        let amortization = principal / Decimal::from(amortizing as u64);
        let daily = daily_rate(demand.monthly_rate);

        let mut records = Vec::with_capacity(installments.len() + 1);
        records.push(InstallmentRecord {
            number: 0,
            due_date: demand.operation_date,
            days_since_operation: 0,
            period_days: 0,
            in_grace: false,
            amortization: Money::ZERO,
            interest: Money::ZERO,
            payment: Money::ZERO,
            balance: principal,
            iof: Money::ZERO,
        });

        let mut balance = principal;
        let mut previous_days = 0;
        for (index, due) in installments.iter().enumerate() {
            let number = index as u32 + 1;
            let grace = in_grace(index, due);
            let period_days = due.days_since_operation - previous_days;

            let interest = if !grace || demand.interest_during_grace {
                simple_interest(balance, daily, period_days)
            } else {
                Money::ZERO
            };
            let amortized = if grace { Money::ZERO } else { amortization };

            // iof accrues on the balance left after this payment
            balance -= amortized;
            let tax = iof.accrue(number, balance, daily, period_days, events)?;

            records.push(InstallmentRecord {
                number,
                due_date: due.date,
                days_since_operation: due.days_since_operation,
                period_days,
                in_grace: grace,
                amortization: amortized,
                interest,
                payment: amortized + interest,
                balance,
                iof: tax,
            });
            previous_days = due.days_since_operation;
        }

        Ok(records)
    }
}

fn totals(principal: Money, records: &[InstallmentRecord]) -> ResultTotals {
    let installments = records.get(1..).unwrap_or(&[]);
    let total_paid: Money = installments.iter().map(|r| r.payment).sum();

    ResultTotals {
        total_paid,
        total_interest: installments.iter().map(|r| r.interest).sum(),
        total_amortization: installments.iter().map(|r| r.amortization).sum(),
        extra_paid: total_paid - principal,
        largest_payment: installments.iter().map(|r| r.payment).max().unwrap_or(Money::ZERO),
        smallest_payment: installments.iter().map(|r| r.payment).min().unwrap_or(Money::ZERO),
    }
}
