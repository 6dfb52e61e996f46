use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::filters::{ChannelSelector, PeriodSelector};
use crate::schema::{ExpenseTable, FixedExpense, OrderRecord};

/// Order amounts are VAT inclusive at a flat 20%.
pub const VAT_DIVISOR: f64 = 1.2;

/// Profit and loss totals for one set of order records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialSummary {
    pub revenue_inc_vat: f64,
    pub revenue_ex_vat: f64,
    pub cost_of_goods: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub commission: f64,
    /// Outbound plus return shipping.
    pub shipping: f64,
    pub penalty: f64,
    pub platform_fee: f64,
    pub marketing_expense: f64,
    pub operating_expense: f64,
    /// Order value of returned lines.
    pub return_loss: f64,
    pub delivered_order_count: u64,
    pub returned_order_count: u64,
    pub delivered_product_quantity: u64,
    pub returned_product_quantity: u64,
}

impl FinancialSummary {
    pub fn total_order_count(&self) -> u64 {
        self.delivered_order_count + self.returned_order_count
    }

    pub fn total_product_quantity(&self) -> u64 {
        self.delivered_product_quantity + self.returned_product_quantity
    }

    /// Per-order charges shown as positive magnitudes.
    pub fn variable_expenses(&self) -> f64 {
        self.commission.abs() + self.shipping.abs() + self.penalty.abs() + self.platform_fee.abs()
    }

    pub fn total_expenses(&self) -> f64 {
        self.variable_expenses() + self.marketing_expense + self.operating_expense
    }

    /// Share of orders that were returned, in percent.
    pub fn return_rate_percent(&self) -> f64 {
        let total = self.total_order_count();
        if total == 0 {
            0.0
        } else {
            self.returned_order_count as f64 / total as f64 * 100.0
        }
    }
}

/// Folds already-filtered records into a [`FinancialSummary`].
///
/// The selectors do not filter `records`; they only decide which fixed
/// expenses apply. Fixed costs belong to the business as a whole, so they are
/// left out entirely as soon as a single channel is selected.
pub fn reduce<'a, I>(
    records: I,
    expenses: &ExpenseTable,
    period: &PeriodSelector,
    channel: &ChannelSelector,
) -> FinancialSummary
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut summary = FinancialSummary::default();

    for record in records {
        summary.commission += record.commission;
        summary.shipping += record.shipping_cost + record.return_shipping_cost;
        summary.penalty += record.penalty_fee;
        summary.platform_fee += record.platform_fee;

        if record.is_return() {
            summary.return_loss += record.order_amount;
            summary.returned_order_count += record.effective_order_count();
            summary.returned_product_quantity += record.quantity;
        } else {
            summary.revenue_inc_vat += record.order_amount;
            summary.cost_of_goods += record.purchase_cost;
            summary.delivered_order_count += record.effective_order_count();
            summary.delivered_product_quantity += record.quantity;
        }
    }

    let fixed = fixed_expenses(expenses, period, channel);
    summary.marketing_expense = fixed.marketing;
    summary.operating_expense = fixed.operations;

    summary.revenue_ex_vat = summary.revenue_inc_vat / VAT_DIVISOR;
    summary.gross_profit = summary.revenue_ex_vat - summary.cost_of_goods;

    let variable = summary.commission + summary.shipping + summary.penalty + summary.platform_fee;
    summary.net_profit = summary.gross_profit
        - variable
        - summary.marketing_expense
        - summary.operating_expense;

    summary
}

fn fixed_expenses(
    expenses: &ExpenseTable,
    period: &PeriodSelector,
    channel: &ChannelSelector,
) -> FixedExpense {
    if !channel.is_all() {
        return FixedExpense::default();
    }

    match period.label() {
        None => expenses.total(),
        Some(label) => expenses.get(label).copied().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Selector;
    use crate::schema::RETURNED_STATUS;

    fn sale(platform: &str, period: &str, amount: f64, cost: f64) -> OrderRecord {
        OrderRecord {
            platform: platform.to_string(),
            period: period.to_string(),
            order_status: "Teslim Edildi".to_string(),
            quantity: 1,
            order_amount: amount,
            purchase_cost: cost,
            ..Default::default()
        }
    }

    fn expenses_for(period: &str, marketing: f64, operations: f64) -> ExpenseTable {
        let mut table = ExpenseTable::new();
        table.insert(
            period,
            FixedExpense {
                marketing,
                operations,
            },
        );
        table
    }

    #[test]
    fn test_single_sale() {
        let records = vec![sale("A", "2025-01", 120.0, 50.0)];
        let summary = reduce(&records, &ExpenseTable::new(), &Selector::All, &Selector::All);

        assert!((summary.revenue_inc_vat - 120.0).abs() < 1e-9);
        assert!((summary.revenue_ex_vat - 100.0).abs() < 1e-9);
        assert!((summary.gross_profit - 50.0).abs() < 1e-9);
        assert!((summary.net_profit - 50.0).abs() < 1e-9);
        assert_eq!(summary.delivered_order_count, 1);
        assert_eq!(summary.returned_order_count, 0);
    }

    #[test]
    fn test_single_return() {
        let mut record = sale("A", "2025-01", 120.0, 50.0);
        record.order_status = RETURNED_STATUS.to_string();
        let summary = reduce(&[record], &ExpenseTable::new(), &Selector::All, &Selector::All);

        assert_eq!(summary.revenue_inc_vat, 0.0);
        assert_eq!(summary.cost_of_goods, 0.0);
        assert!((summary.return_loss - 120.0).abs() < 1e-9);
        assert_eq!(summary.returned_order_count, 1);
        assert_eq!(summary.delivered_order_count, 0);
        assert_eq!(summary.returned_product_quantity, 1);
    }

    #[test]
    fn test_charges_accumulate_for_returns_too() {
        let mut returned = sale("A", "2025 Ocak", 200.0, 80.0);
        returned.order_status = RETURNED_STATUS.to_string();
        returned.commission = 10.0;
        returned.shipping_cost = 5.0;
        returned.return_shipping_cost = 7.0;
        returned.penalty_fee = 2.0;
        returned.platform_fee = 1.0;

        let summary = reduce(&[returned], &ExpenseTable::new(), &Selector::All, &Selector::All);
        assert!((summary.commission - 10.0).abs() < 1e-9);
        assert!((summary.shipping - 12.0).abs() < 1e-9);
        assert!((summary.penalty - 2.0).abs() < 1e-9);
        assert!((summary.platform_fee - 1.0).abs() < 1e-9);
        assert!((summary.net_profit + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_expense_inclusion() {
        let records = vec![sale("A", "2025 Ocak", 120.0, 0.0), sale("B", "2025 Şubat", 60.0, 0.0)];
        let table = expenses_for("2025 Ocak", 100.0, 0.0);

        let by_period = reduce(&records, &table, &Selector::only("2025 Ocak"), &Selector::All);
        assert_eq!(by_period.marketing_expense, 100.0);

        let all_periods = reduce(&records, &table, &Selector::All, &Selector::All);
        assert_eq!(all_periods.marketing_expense, 100.0);

        let missing_period = reduce(&records, &table, &Selector::only("2025 Mart"), &Selector::All);
        assert_eq!(missing_period.marketing_expense, 0.0);

        for period in [Selector::All, Selector::only("2025 Ocak")] {
            let channel = reduce(&records, &table, &period, &Selector::only("ChannelX"));
            assert_eq!(channel.marketing_expense, 0.0);
            assert_eq!(channel.operating_expense, 0.0);
        }
    }

    #[test]
    fn test_net_profit_identity() {
        let mut records = vec![
            sale("A", "2025 Ocak", 1200.0, 400.0),
            sale("B", "2025 Ocak", 600.0, 250.0),
        ];
        records[0].commission = 120.0;
        records[0].shipping_cost = 35.0;
        records[1].platform_fee = 9.5;
        records[1].penalty_fee = 20.0;
        records[1].return_shipping_cost = 12.0;

        let table = expenses_for("2025 Ocak", 150.0, 300.0);
        let s = reduce(&records, &table, &Selector::All, &Selector::All);

        assert_eq!(s.revenue_ex_vat, s.revenue_inc_vat / 1.2);
        assert!((s.gross_profit - (s.revenue_ex_vat - s.cost_of_goods)).abs() < 1e-9);
        let expected_net = s.gross_profit
            - (s.commission + s.shipping + s.penalty + s.platform_fee)
            - s.marketing_expense
            - s.operating_expense;
        assert!((s.net_profit - expected_net).abs() < 1e-9);
    }

    #[test]
    fn test_order_count_partition() {
        let mut records = vec![
            sale("A", "2025 Ocak", 100.0, 0.0),
            sale("A", "2025 Ocak", 100.0, 0.0),
            sale("A", "2025 Ocak", 100.0, 0.0),
        ];
        records[0].order_count = 3;
        records[1].order_status = RETURNED_STATUS.to_string();
        records[1].order_count = 2;

        let s = reduce(&records, &ExpenseTable::new(), &Selector::All, &Selector::All);
        let expected: u64 = records.iter().map(|r| r.effective_order_count()).sum();
        assert_eq!(s.delivered_order_count, 4);
        assert_eq!(s.returned_order_count, 2);
        assert_eq!(s.total_order_count(), expected);
    }

    #[test]
    fn test_empty_input() {
        let none: Vec<OrderRecord> = Vec::new();
        let s = reduce(&none, &ExpenseTable::new(), &Selector::All, &Selector::All);
        assert_eq!(s, FinancialSummary::default());
        assert_eq!(s.return_rate_percent(), 0.0);
    }

    #[test]
    fn test_derived_totals() {
        let s = FinancialSummary {
            commission: -10.0,
            shipping: 20.0,
            penalty: -5.0,
            platform_fee: 3.0,
            marketing_expense: 100.0,
            operating_expense: 50.0,
            delivered_order_count: 3,
            returned_order_count: 1,
            ..Default::default()
        };
        assert!((s.variable_expenses() - 38.0).abs() < 1e-9);
        assert!((s.total_expenses() - 188.0).abs() < 1e-9);
        assert!((s.return_rate_percent() - 25.0).abs() < 1e-9);
    }
}
