/// serialization support for calculation results
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::engine::{AmortizationResult, InstallmentRecord};
use crate::errors::{CreditError, Result};
use crate::types::{AmortizationEntry, SimulationId, ValueKind};

/// value kind of each recognised request field
pub static FIELD_KINDS: &[(&str, ValueKind)] = &[
    ("financiado", ValueKind::Currency),
    ("liquido", ValueKind::Currency),
    ("data_operacao", ValueKind::Date),
    ("diabase", ValueKind::Integer),
    ("jurosAm", ValueKind::Percent),
    ("prazoMeses", ValueKind::Integer),
    ("carenciaDias", ValueKind::Integer),
    ("tac", ValueKind::Percent),
    ("flat", ValueKind::Percent),
    ("tipo", ValueKind::Integer),
    ("jurosNaCarencia", ValueKind::Flag),
    ("simplesn", ValueKind::Flag),
];

pub fn field_kind(name: &str) -> Option<ValueKind> {
    FIELD_KINDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, kind)| *kind)
}

/// serializable view of a result for display
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultView {
    pub simulation_id: SimulationId,
    pub operation_date: NaiveDate,
    pub summary: SummaryView,
    pub costs: CostsView,
    pub installments: Vec<InstallmentView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryView {
    pub principal: String,
    pub net_value: String,
    pub monthly_rate: String,
    pub term: u32,
    pub first_due: NaiveDate,
    pub last_due: NaiveDate,
    pub business_days: u32,
    pub total_paid: String,
    pub total_interest: String,
    pub extra_paid: String,
    pub largest_payment: String,
    pub smallest_payment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CostsView {
    pub tac: String,
    pub flat: String,
    pub iof_daily: String,
    pub iof_additional: String,
    pub iof_total: String,
    pub iof_cap_reached: bool,
    pub total: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallmentView {
    pub number: u32,
    pub due_date: NaiveDate,
    pub days: u32,
    /// `None` when equal to the first amortizing installment
    pub amortization: Option<String>,
    pub interest: String,
    pub payment: String,
    pub balance: String,
    pub iof: String,
}

impl ResultView {
    pub fn from_result(result: &AmortizationResult) -> Self {
        let installments = result
            .records
            .iter()
            .zip(result.compact_amortizations())
            .map(|(record, entry)| InstallmentView::from_record(record, entry))
            .collect();

        ResultView {
            simulation_id: result.simulation_id,
            operation_date: result.demand.operation_date,
            summary: SummaryView {
                principal: result.principal.format(),
                net_value: result.net_value.format(),
                monthly_rate: result.demand.monthly_rate.format(),
                term: result.demand.term,
                first_due: result.first_due,
                last_due: result.last_due,
                business_days: result.business_days,
                total_paid: result.totals.total_paid.format(),
                total_interest: result.totals.total_interest.format(),
                extra_paid: result.totals.extra_paid.format(),
                largest_payment: result.totals.largest_payment.format(),
                smallest_payment: result.totals.smallest_payment.format(),
            },
            costs: CostsView {
                tac: result.costs.tac.format(),
                flat: result.costs.flat.format(),
                iof_daily: result.costs.iof.daily.format(),
                iof_additional: result.costs.iof.additional.format(),
                iof_total: result.costs.iof.total.format(),
                iof_cap_reached: result.costs.iof.cap_reached,
                total: result.costs.total.format(),
            },
            installments,
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl InstallmentView {
    fn from_record(record: &InstallmentRecord, entry: AmortizationEntry) -> Self {
        InstallmentView {
            number: record.number,
            due_date: record.due_date,
            days: record.period_days,
            amortization: match entry {
                AmortizationEntry::Explicit(amount) => Some(amount.format()),
                AmortizationEntry::Repeated => None,
            },
            interest: record.interest.format(),
            payment: record.payment.format(),
            balance: record.balance.format(),
            iof: record.iof.format(),
        }
    }
}

/// full result as json, money and rates as exact decimal strings
pub fn result_to_json(result: &AmortizationResult) -> Result<String> {
    serde_json::to_string(result).map_err(|e| CreditError::calculation(format!("serialize result: {}", e)))
}

pub fn result_from_json(json: &str) -> Result<AmortizationResult> {
    serde_json::from_str(json).map_err(|e| CreditError::invalid_input(format!("result json: {}", e)))
}

/// display form of a percent or currency value
pub fn format_amount(kind: ValueKind, value: rust_decimal::Decimal) -> Option<String> {
    match kind {
        ValueKind::Percent => Some(Rate::from_decimal(value).format()),
        ValueKind::Currency => Some(Money::from_decimal(value).format()),
        _ => None,
    }
}
