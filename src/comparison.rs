use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::filters::Selector;
use crate::metrics::{reduce, FinancialSummary};
use crate::schema::{ExpenseTable, OrderRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    Revenue,
    NetProfit,
    /// Everything between VAT-inclusive revenue and net profit.
    Expenses,
}

impl ComparisonMetric {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue",
            Self::NetProfit => "Net profit",
            Self::Expenses => "Expenses",
        }
    }
}

/// One bar group of the comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonRow {
    pub metric: ComparisonMetric,
    pub first: f64,
    pub second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonResult {
    pub first_period: String,
    pub second_period: String,
    pub first: FinancialSummary,
    pub second: FinancialSummary,
    /// Second minus first, VAT inclusive.
    pub revenue_delta: f64,
    pub net_profit_delta: f64,
    pub order_count_delta: i64,
    pub chart: Vec<ComparisonRow>,
}

/// Month-over-month comparison across all channels.
///
/// Returns `None` when either period label is empty.
pub fn compare(
    records: &[OrderRecord],
    expenses: &ExpenseTable,
    first_period: &str,
    second_period: &str,
) -> Option<ComparisonResult> {
    if first_period.is_empty() || second_period.is_empty() {
        debug!("Comparison skipped: a period is not selected");
        return None;
    }

    let first = summarize_period(records, expenses, first_period);
    let second = summarize_period(records, expenses, second_period);

    let chart = vec![
        ComparisonRow {
            metric: ComparisonMetric::Revenue,
            first: first.revenue_inc_vat,
            second: second.revenue_inc_vat,
        },
        ComparisonRow {
            metric: ComparisonMetric::NetProfit,
            first: first.net_profit,
            second: second.net_profit,
        },
        ComparisonRow {
            metric: ComparisonMetric::Expenses,
            first: first.revenue_inc_vat - first.net_profit,
            second: second.revenue_inc_vat - second.net_profit,
        },
    ];

    Some(ComparisonResult {
        first_period: first_period.to_string(),
        second_period: second_period.to_string(),
        revenue_delta: second.revenue_inc_vat - first.revenue_inc_vat,
        net_profit_delta: second.net_profit - first.net_profit,
        order_count_delta: second.total_order_count() as i64 - first.total_order_count() as i64,
        first,
        second,
        chart,
    })
}

fn summarize_period(
    records: &[OrderRecord],
    expenses: &ExpenseTable,
    period: &str,
) -> FinancialSummary {
    let selector = Selector::only(period);
    reduce(
        records.iter().filter(|r| r.period == period),
        expenses,
        &selector,
        &Selector::All,
    )
}
