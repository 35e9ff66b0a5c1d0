use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::SimulationId;

/// all events that can be emitted during a calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // schedule events
    ScheduleGenerated {
        installments: u32,
        first_due: NaiveDate,
        last_due: NaiveDate,
        from_cache: bool,
    },

    // cost events
    CostCapped {
        label: String,
        raw_amount: Money,
        limit: Money,
    },
    IofCapReached {
        installment: u32,
        accrued: Money,
        cap: Money,
    },

    // solver events
    SolverIteration {
        iteration: u32,
        candidate: Money,
        net_value: Money,
        error: Money,
    },
    SolverConverged {
        net_target: Money,
        gross_value: Money,
        iterations: u32,
    },

    // lifecycle
    CalculationCompleted {
        simulation_id: SimulationId,
        principal: Money,
        net_value: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during a calculation
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
