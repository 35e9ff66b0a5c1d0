use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::events::{Event, EventStore};
use crate::types::Amount;

/// an upfront charge: the base value and an optional ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CostSpec {
    pub value: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<Amount>,
}

impl CostSpec {
    pub fn new(value: Amount) -> Self {
        Self { value, cap: None }
    }

    pub fn with_cap(mut self, cap: Amount) -> Self {
        self.cap = Some(cap);
        self
    }

    /// base amount before the cap is applied
    pub fn base_amount(&self, principal: Money) -> Money {
        self.value.resolve(principal)
    }
}

/// base amount of a cost clamped to its cap
///
/// A percentage cap that bites is recorded as `Event::CostCapped` under `label`.
pub fn compute_cost(principal: Money, spec: &CostSpec, label: &str, events: &mut EventStore) -> Money {
    let raw = spec.base_amount(principal);
    let mut on_cap = |limit: Money| {
        tracing::warn!(label, %raw, %limit, "cost capped");
        events.emit(Event::CostCapped {
            label: label.to_string(),
            raw_amount: raw,
            limit,
        });
    };

    limit_to_cap(principal, spec, raw, Some(&mut on_cap as &mut dyn FnMut(Money)))
}

/// clamp `raw` to the cap of `spec`
///
/// A currency cap clamps silently. A percentage cap clamps to
/// `cap × principal` and reports the limit through `on_cap_reached`.
pub fn limit_to_cap(
    principal: Money,
    spec: &CostSpec,
    raw: Money,
    on_cap_reached: Option<&mut dyn FnMut(Money)>,
) -> Money {
    match spec.cap {
        None => raw,
        Some(Amount::Currency(limit)) => raw.min(limit),
        Some(Amount::Percent(rate)) => {
            let limit = principal.apply(rate);
            if raw > limit {
                if let Some(callback) = on_cap_reached {
                    callback(limit);
                }
                limit
            } else {
                raw
            }
        }
    }
}
