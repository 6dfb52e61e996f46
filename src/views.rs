//! Grouped and ranked views over order records, one per dashboard panel.
//!
//! Every function takes records that were already narrowed down by a
//! [`RecordFilter`](crate::filters::RecordFilter). Rankings sort stably by
//! their key, descending, so ties keep the order in which groups first
//! appeared.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::metrics::FinancialSummary;
use crate::schema::OrderRecord;

/// Length of every "top N" list.
pub const TOP_N: usize = 5;

/// Bucket for records without a product group.
pub const DEFAULT_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelRevenue {
    pub platform: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseBucket {
    CostOfGoods,
    Commission,
    Shipping,
    Marketing,
    Operations,
    Penalty,
    PlatformFee,
    PlatformAndPenalty,
    ReturnLoss,
}

impl ExpenseBucket {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CostOfGoods => "Cost of goods",
            Self::Commission => "Commission",
            Self::Shipping => "Shipping",
            Self::Marketing => "Marketing",
            Self::Operations => "Operations",
            Self::Penalty => "Penalty",
            Self::PlatformFee => "Platform fee",
            Self::PlatformAndPenalty => "Platform & penalty",
            Self::ReturnLoss => "Return loss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExpenseSlice {
    pub bucket: ExpenseBucket,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProductQuantity {
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryStat {
    pub name: String,
    pub revenue: f64,
    pub quantity: u64,
    pub top_products: Vec<ProductQuantity>,
}

impl CategoryStat {
    /// This category's revenue as a percentage of `total_revenue`.
    pub fn revenue_share_percent(&self, total_revenue: f64) -> f64 {
        if total_revenue > 0.0 {
            self.revenue / total_revenue * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReturnedProduct {
    pub name: String,
    pub quantity: u64,
    pub lost_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReturnStats {
    pub by_quantity: Vec<ReturnedProduct>,
    pub by_amount: Vec<ReturnedProduct>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductSearchMetrics {
    pub delivered_quantity: u64,
    pub delivered_revenue: f64,
    pub returned_quantity: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductListing {
    pub total_matches: usize,
    pub records: Vec<OrderRecord>,
}

/// Groups keyed by label, iterated in order of first appearance.
struct Groups<T> {
    index: HashMap<String, usize>,
    entries: Vec<(String, T)>,
}

impl<T> Groups<T> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn into_entries(self) -> Vec<(String, T)> {
        self.entries
    }
}

impl<T> Default for Groups<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> Groups<T> {
    fn entry(&mut self, key: &str) -> &mut T {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.index.insert(key.to_string(), idx);
                self.entries.push((key.to_string(), T::default()));
                idx
            }
        };
        &mut self.entries[idx].1
    }
}

/// Delivered revenue (VAT inclusive) per platform, highest first.
pub fn channel_revenue<'a, I>(records: I) -> Vec<ChannelRevenue>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut groups: Groups<f64> = Groups::new();
    for record in records.into_iter().filter(|r| !r.is_return()) {
        *groups.entry(&record.platform) += record.order_amount;
    }

    let mut result: Vec<ChannelRevenue> = groups
        .into_entries()
        .into_iter()
        .map(|(platform, revenue)| ChannelRevenue { platform, revenue })
        .collect();
    result.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    result
}

/// Overview pie slices. Charges are shown as magnitudes; empty buckets are dropped.
pub fn expense_breakdown(summary: &FinancialSummary) -> Vec<ExpenseSlice> {
    positive_slices([
        (ExpenseBucket::Commission, summary.commission.abs()),
        (ExpenseBucket::Shipping, summary.shipping.abs()),
        (ExpenseBucket::Marketing, summary.marketing_expense),
        (ExpenseBucket::Operations, summary.operating_expense),
        (ExpenseBucket::Penalty, summary.penalty.abs()),
        (ExpenseBucket::PlatformFee, summary.platform_fee.abs()),
        (ExpenseBucket::ReturnLoss, summary.return_loss),
    ])
}

/// Cost structure of a single channel, where fixed costs never apply.
pub fn channel_expense_breakdown(summary: &FinancialSummary) -> Vec<ExpenseSlice> {
    positive_slices([
        (ExpenseBucket::CostOfGoods, summary.cost_of_goods),
        (ExpenseBucket::Commission, summary.commission.abs()),
        (ExpenseBucket::Shipping, summary.shipping.abs()),
        (
            ExpenseBucket::PlatformAndPenalty,
            summary.platform_fee.abs() + summary.penalty.abs(),
        ),
    ])
}

fn positive_slices<const N: usize>(buckets: [(ExpenseBucket, f64); N]) -> Vec<ExpenseSlice> {
    buckets
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(bucket, value)| ExpenseSlice { bucket, value })
        .collect()
}

#[derive(Default)]
struct CategoryAccumulator {
    revenue: f64,
    quantity: u64,
    products: Groups<u64>,
}

/// Delivered revenue and units per product group, highest revenue first,
/// each with its five best-selling products.
pub fn category_stats<'a, I>(records: I) -> Vec<CategoryStat>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut groups: Groups<CategoryAccumulator> = Groups::new();

    for record in records.into_iter().filter(|r| !r.is_return()) {
        let name = if record.product_group.is_empty() {
            DEFAULT_CATEGORY
        } else {
            record.product_group.as_str()
        };

        let category = groups.entry(name);
        category.revenue += record.order_amount;
        category.quantity += record.quantity;
        *category.products.entry(&record.product_description) += record.quantity;
    }

    let mut stats: Vec<CategoryStat> = groups
        .into_entries()
        .into_iter()
        .map(|(name, acc)| CategoryStat {
            name,
            revenue: acc.revenue,
            quantity: acc.quantity,
            top_products: top_quantities(acc.products),
        })
        .collect();
    stats.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    stats
}

/// Returned units and lost revenue per product, ranked two ways.
pub fn return_stats<'a, I>(records: I) -> ReturnStats
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut groups: Groups<(u64, f64)> = Groups::new();

    for record in records.into_iter().filter(|r| r.is_return()) {
        let entry = groups.entry(&record.product_description);
        // a returned line with no quantity still counts as one unit
        entry.0 += record.quantity.max(1);
        entry.1 += record.order_amount;
    }

    let products: Vec<ReturnedProduct> = groups
        .into_entries()
        .into_iter()
        .map(|(name, (quantity, lost_amount))| ReturnedProduct {
            name,
            quantity,
            lost_amount,
        })
        .collect();

    let mut by_quantity = products.clone();
    by_quantity.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    by_quantity.truncate(TOP_N);

    let mut by_amount = products;
    by_amount.sort_by(|a, b| b.lost_amount.total_cmp(&a.lost_amount));
    by_amount.truncate(TOP_N);

    ReturnStats {
        by_quantity,
        by_amount,
    }
}

/// The five products with the most delivered units.
pub fn top_selling_products<'a, I>(records: I) -> Vec<ProductQuantity>
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut groups: Groups<u64> = Groups::new();
    for record in records.into_iter().filter(|r| !r.is_return()) {
        *groups.entry(&record.product_description) += record.quantity;
    }
    top_quantities(groups)
}

fn top_quantities(groups: Groups<u64>) -> Vec<ProductQuantity> {
    let mut products: Vec<ProductQuantity> = groups
        .into_entries()
        .into_iter()
        .map(|(name, quantity)| ProductQuantity { name, quantity })
        .collect();
    products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    products.truncate(TOP_N);
    products
}

pub fn product_search_metrics<'a, I>(records: I) -> ProductSearchMetrics
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    records
        .into_iter()
        .fold(ProductSearchMetrics::default(), |mut acc, record| {
            if record.is_return() {
                acc.returned_quantity += record.quantity;
            } else {
                acc.delivered_quantity += record.quantity;
                acc.delivered_revenue += record.order_amount;
            }
            acc
        })
}

/// The first `limit` matching records in input order, with the full match count.
pub fn product_listing<'a, I>(records: I, limit: usize) -> ProductListing
where
    I: IntoIterator<Item = &'a OrderRecord>,
{
    let mut listing = ProductListing::default();
    for record in records {
        if listing.records.len() < limit {
            listing.records.push(record.clone());
        }
        listing.total_matches += 1;
    }
    listing
}
