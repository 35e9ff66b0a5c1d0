use chrono::{DateTime, Datelike, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::calendar::{days_in_month, BusinessCalendar};
use crate::config::IofConfig;
use crate::costs::CostSpec;
use crate::decimal::{Money, Rate};
use crate::errors::{CreditError, Result};
use crate::schedule::ScheduleKey;
use crate::serialization::field_kind;
use crate::types::{AmortizationSystem, Amount, BorrowerKind, ValueKind};

pub const MAX_TERM: u32 = 460;
pub const MAX_GRACE_DAYS: u32 = 360;
pub const DEFAULT_ANCHOR_DAY: u32 = 30;
pub const DEFAULT_TERM: u32 = 12;
/// largest principal, net value or currency cost accepted
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// what drives the calculation: a known principal or a net amount to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CreditTarget {
    /// gross amount financed (bruto)
    pub principal: Option<Money>,
    /// amount the borrower should receive (líquido)
    pub net_value: Option<Money>,
}

impl CreditTarget {
    pub fn principal(amount: Money) -> Self {
        Self {
            principal: Some(amount),
            net_value: None,
        }
    }

    pub fn net_value(amount: Money) -> Self {
        Self {
            principal: None,
            net_value: Some(amount),
        }
    }

    /// amount used to pick tax brackets
    pub fn reference_amount(&self) -> Option<Money> {
        self.principal.or(self.net_value)
    }
}

/// a validated credit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditDemand {
    pub target: CreditTarget,
    pub operation_date: NaiveDate,
    pub anchor_day: u32,
    /// number of installments
    pub term: u32,
    pub grace_days: u32,
    pub monthly_rate: Rate,
    pub tac: CostSpec,
    pub flat: CostSpec,
    pub iof: IofConfig,
    pub system: AmortizationSystem,
    pub interest_during_grace: bool,
    pub simplified_regime: bool,
    pub borrower: BorrowerKind,
}

impl CreditDemand {
    pub fn builder() -> CreditDemandBuilder {
        CreditDemandBuilder::new()
    }

    pub fn schedule_key(&self) -> ScheduleKey {
        ScheduleKey {
            operation_date: self.operation_date,
            anchor_day: self.anchor_day,
            term: self.term,
            grace_days: self.grace_days,
        }
    }

    /// copy of this demand driven by a known principal
    pub fn with_principal(&self, principal: Money) -> Self {
        Self {
            target: CreditTarget {
                principal: Some(principal),
                net_value: self.target.net_value,
            },
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.principal.is_none() && self.target.net_value.is_none() {
            return Err(CreditError::invalid_input("either a principal or a net value is required"));
        }
        for amount in [self.target.principal, self.target.net_value].into_iter().flatten() {
            if !amount.is_positive() {
                return Err(CreditError::invalid_input(format!("amount must be positive, got {}", amount)));
            }
            check_amount_ceiling("amount", amount)?;
        }
        if !(1..=MAX_TERM).contains(&self.term) {
            return Err(CreditError::invalid_input(format!(
                "term must be between 1 and {}, got {}",
                MAX_TERM, self.term
            )));
        }
        if !(1..=31).contains(&self.anchor_day) {
            return Err(CreditError::invalid_input(format!(
                "anchor day must be between 1 and 31, got {}",
                self.anchor_day
            )));
        }
        if self.grace_days > MAX_GRACE_DAYS {
            return Err(CreditError::invalid_input(format!(
                "grace period must be at most {} days, got {}",
                MAX_GRACE_DAYS, self.grace_days
            )));
        }
        if self.monthly_rate < Rate::ZERO || self.monthly_rate > Rate::ONE {
            return Err(CreditError::invalid_input(format!(
                "monthly rate must be between 0 and 1, got {}",
                self.monthly_rate.as_decimal()
            )));
        }
        for (name, cost) in [("tac", &self.tac), ("flat", &self.flat)] {
            check_cost_amount(name, cost.value)?;
            if let Some(cap) = cost.cap {
                check_cost_amount(name, cap)?;
            }
        }
        for (name, rate) in [("daily iof", self.iof.daily), ("additional iof", self.iof.additional)] {
            check_cost_amount(name, Amount::percent(rate))?;
        }
        if let Some(cap) = self.iof.cap {
            check_cost_amount("iof cap", cap)?;
        }
        Ok(())
    }
}

fn check_amount_ceiling(name: &str, amount: Money) -> Result<()> {
    if amount > Money::from_major(MAX_AMOUNT) {
        return Err(CreditError::invalid_input(format!(
            "{} must be at most {}, got {}",
            name,
            Money::from_major(MAX_AMOUNT),
            amount
        )));
    }
    Ok(())
}

// percentages above 100% or beyond the amount ceiling would overflow the solver
fn check_cost_amount(name: &str, amount: Amount) -> Result<()> {
    match amount {
        Amount::Percent(rate) if rate < Rate::ZERO || rate > Rate::ONE => Err(CreditError::invalid_input(format!(
            "{} must be between 0% and 100%, got {}",
            name, rate
        ))),
        Amount::Currency(money) if money.is_negative() => Err(CreditError::invalid_input(format!(
            "{} must not be negative, got {}",
            name, money
        ))),
        Amount::Currency(money) => check_amount_ceiling(name, money),
        Amount::Percent(_) => Ok(()),
    }
}

/// builder for credit demands
#[derive(Debug, Clone, Default)]
pub struct CreditDemandBuilder {
    target: CreditTarget,
    operation_date: Option<NaiveDate>,
    anchor_day: Option<u32>,
    term: Option<u32>,
    grace_days: u32,
    monthly_rate: Option<Rate>,
    tac: CostSpec,
    flat: CostSpec,
    iof: Option<IofConfig>,
    system: AmortizationSystem,
    interest_during_grace: bool,
    simplified_regime: bool,
    borrower: BorrowerKind,
}

impl CreditDemandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(mut self, amount: Money) -> Self {
        self.target.principal = Some(amount);
        self
    }

    pub fn net_value(mut self, amount: Money) -> Self {
        self.target.net_value = Some(amount);
        self
    }

    pub fn operation_date(mut self, date: NaiveDate) -> Self {
        self.operation_date = Some(date);
        self
    }

    pub fn anchor_day(mut self, day: u32) -> Self {
        self.anchor_day = Some(day);
        self
    }

    pub fn term(mut self, installments: u32) -> Self {
        self.term = Some(installments);
        self
    }

    pub fn grace_days(mut self, days: u32) -> Self {
        self.grace_days = days;
        self
    }

    pub fn monthly_rate(mut self, rate: Rate) -> Self {
        self.monthly_rate = Some(rate);
        self
    }

    pub fn tac(mut self, spec: CostSpec) -> Self {
        self.tac = spec;
        self
    }

    pub fn flat(mut self, spec: CostSpec) -> Self {
        self.flat = spec;
        self
    }

    pub fn iof(mut self, iof: IofConfig) -> Self {
        self.iof = Some(iof);
        self
    }

    pub fn system(mut self, system: AmortizationSystem) -> Self {
        self.system = system;
        self
    }

    pub fn interest_during_grace(mut self, enabled: bool) -> Self {
        self.interest_during_grace = enabled;
        self
    }

    pub fn simplified_regime(mut self, enabled: bool) -> Self {
        self.simplified_regime = enabled;
        self
    }

    pub fn borrower(mut self, kind: BorrowerKind) -> Self {
        self.borrower = kind;
        self
    }

    /// build, taking the operation date from `time` when unset
    pub fn build_with_time(self, time: &SafeTimeProvider) -> Result<CreditDemand> {
        let operation_date = self.operation_date.unwrap_or_else(|| time.now().date_naive());
        let reference = self.target.reference_amount().unwrap_or(Money::ZERO);
        let iof = self
            .iof
            .unwrap_or_else(|| IofConfig::for_borrower(self.borrower, self.simplified_regime, reference));

        let demand = CreditDemand {
            target: self.target,
            operation_date,
            anchor_day: self.anchor_day.unwrap_or(DEFAULT_ANCHOR_DAY),
            term: self.term.unwrap_or(DEFAULT_TERM),
            grace_days: self.grace_days,
            monthly_rate: self.monthly_rate.unwrap_or_else(|| Rate::from_percentage(1)),
            tac: self.tac,
            flat: self.flat,
            iof,
            system: self.system,
            interest_during_grace: self.interest_during_grace,
            simplified_regime: self.simplified_regime,
            borrower: self.borrower,
        };
        demand.validate()?;
        Ok(demand)
    }

    /// build with system time
    pub fn build(self) -> Result<CreditDemand> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.build_with_time(&time)
    }
}

/// turns a loosely typed json request into a `CreditDemand`
///
/// Out of range or unreadable scalars fall back to their defaults. Only a
/// missing amount or a cost object with an unknown kind is an error.
pub struct DemandNormalizer<'a> {
    borrower: BorrowerKind,
    time: &'a SafeTimeProvider,
    calendar: &'a BusinessCalendar,
}

impl<'a> DemandNormalizer<'a> {
    pub fn new(borrower: BorrowerKind, time: &'a SafeTimeProvider, calendar: &'a BusinessCalendar) -> Self {
        Self {
            borrower,
            time,
            calendar,
        }
    }

    pub fn normalize(&self, input: &Value) -> Result<CreditDemand> {
        let fields = input
            .as_object()
            .ok_or_else(|| CreditError::invalid_input("credit request must be a json object"))?;

        let principal = self.positive_money(fields, "financiado");
        let net_value = self.positive_money(fields, "liquido");
        if principal.is_none() && net_value.is_none() {
            return Err(CreditError::invalid_input("either financiado or liquido must be provided"));
        }
        let target = CreditTarget {
            principal,
            net_value: if principal.is_some() { None } else { net_value },
        };

        let requested = fields.get("data_operacao").and_then(read_date);
        let operation_date = self
            .calendar
            .resolve_or_next(requested.unwrap_or_else(|| self.time.now().date_naive()));

        let month_length = days_in_month(operation_date.year(), operation_date.month());
        let anchor_day = read_integer(fields, "diabase")
            .filter(|day| (1..=month_length).contains(day))
            .unwrap_or(DEFAULT_ANCHOR_DAY)
            .min(month_length);

        let monthly_rate = fields
            .get("jurosAm")
            .and_then(|v| read_rate(v, field_kind("jurosAm")))
            .filter(|rate| *rate >= Rate::ZERO && *rate <= Rate::ONE)
            .unwrap_or_else(|| Rate::from_percentage(1));

        let term = read_integer(fields, "prazoMeses")
            .filter(|n| (1..=MAX_TERM).contains(n))
            .unwrap_or(DEFAULT_TERM);

        let grace_days = read_integer(fields, "carenciaDias")
            .filter(|n| *n <= MAX_GRACE_DAYS)
            .unwrap_or(0);

        let tac = read_cost(fields, "tac")?;
        let flat = read_cost(fields, "flat")?;

        let system = match fields.get("tipo") {
            Some(Value::Number(n)) if n.as_u64() == Some(2) => AmortizationSystem::Price,
            Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("price") || s.trim() == "2" => {
                AmortizationSystem::Price
            }
            _ => AmortizationSystem::Sac,
        };

        let interest_during_grace = read_flag(fields, "jurosNaCarencia").unwrap_or(false);
        let simplified_regime = read_flag(fields, "simplesn").unwrap_or(false);

        let reference = target.reference_amount().unwrap_or(Money::ZERO);
        let preset = IofConfig::for_borrower(self.borrower, simplified_regime, reference);
        let iof = read_iof_overrides(fields, preset)?;

        let demand = CreditDemand {
            target,
            operation_date,
            anchor_day,
            term,
            grace_days,
            monthly_rate,
            tac,
            flat,
            iof,
            system,
            interest_during_grace,
            simplified_regime,
            borrower: self.borrower,
        };

        tracing::debug!(
            operation_date = %demand.operation_date,
            term = demand.term,
            anchor_day = demand.anchor_day,
            grace_days = demand.grace_days,
            "credit request normalized"
        );

        demand.validate()?;
        Ok(demand)
    }

    fn positive_money(&self, fields: &Map<String, Value>, name: &str) -> Option<Money> {
        match fields.get(name).and_then(|v| read_amount(v, field_kind(name))) {
            Some(Amount::Currency(money)) if money.is_positive() => Some(money),
            _ => None,
        }
    }
}

fn read_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
        }
        Value::String(s) => {
            let text = s.trim().replace(',', ".");
            Decimal::from_str(&text).ok()
        }
        _ => None,
    }
}

/// a percent or currency value
///
/// Strings carrying a mark (`"1%"`, `"$ 500"`) pick their own kind; bare
/// numbers take `default_kind`, with percents read as fractions.
fn read_amount(value: &Value, default_kind: Option<ValueKind>) -> Option<Amount> {
    if let Value::String(s) = value {
        let text = s.trim();
        if text.ends_with(Rate::MARK) {
            return Rate::parse(text).ok().map(Amount::Percent);
        }
        if text.starts_with(Money::MARK.trim_end()) {
            return Money::parse(text).ok().map(Amount::Currency);
        }
    }

    let number = read_decimal(value)?;
    if number.is_sign_negative() {
        return None;
    }
    match default_kind {
        Some(ValueKind::Currency) => Some(Amount::Currency(Money::from_decimal(number))),
        _ => Some(Amount::Percent(Rate::from_decimal(number))),
    }
}

fn read_rate(value: &Value, default_kind: Option<ValueKind>) -> Option<Rate> {
    match read_amount(value, default_kind)? {
        Amount::Percent(rate) => Some(rate),
        Amount::Currency(_) => None,
    }
}

fn read_integer(fields: &Map<String, Value>, name: &str) -> Option<u32> {
    match fields.get(name)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn read_flag(fields: &Map<String, Value>, name: &str) -> Option<bool> {
    match fields.get(name)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn read_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// tagged `{kind, value}` object
fn read_tagged_amount(object: &Map<String, Value>, name: &str) -> Result<Option<Amount>> {
    let kind = match object.get("kind").and_then(Value::as_str) {
        Some("percent") => ValueKind::Percent,
        Some("currency") => ValueKind::Currency,
        other => {
            return Err(CreditError::invalid_input(format!(
                "{} must be a percent or currency amount, got kind {:?}",
                name, other
            )))
        }
    };

    let amount = object.get("value").and_then(|v| read_amount(v, Some(kind)));
    Ok(amount.filter(|a| a.kind() == kind))
}

fn read_cost(fields: &Map<String, Value>, name: &str) -> Result<CostSpec> {
    let value = match fields.get(name) {
        Some(value) => value,
        None => return Ok(CostSpec::default()),
    };

    match value {
        Value::Object(object) => {
            let amount = read_tagged_amount(object, name)?.unwrap_or_default();
            let cap = match object.get("cap") {
                Some(Value::Object(cap)) => read_tagged_amount(cap, name)?,
                Some(other) => read_amount(other, field_kind(name)),
                None => None,
            };
            Ok(CostSpec { value: amount, cap })
        }
        other => Ok(CostSpec::new(read_amount(other, field_kind(name)).unwrap_or_default())),
    }
}

/// `{"iof": {"p": {"diario", "adicional", "teto"}}}`, each falling back to the preset
fn read_iof_overrides(fields: &Map<String, Value>, preset: IofConfig) -> Result<IofConfig> {
    let params = match fields.get("iof").and_then(|iof| iof.get("p")).and_then(Value::as_object) {
        Some(params) => params,
        None => return Ok(preset),
    };

    let daily = params
        .get("diario")
        .and_then(|v| read_rate(v, Some(ValueKind::Percent)))
        .unwrap_or(preset.daily);
    let additional = params
        .get("adicional")
        .and_then(|v| read_rate(v, Some(ValueKind::Percent)))
        .unwrap_or(preset.additional);
    let cap = match params.get("teto") {
        Some(Value::Object(cap)) => read_tagged_amount(cap, "teto")?.or(preset.cap),
        Some(other) => read_amount(other, Some(ValueKind::Percent)).or(preset.cap),
        None => preset.cap,
    };

    Ok(IofConfig { daily, additional, cap })
}
