//! # Seller Profit Analytics
//!
//! Profit and loss analytics for e-commerce sellers. Order lines exported from
//! marketplaces plus a table of fixed monthly costs are reduced into VAT-aware
//! financial summaries, channel and category breakdowns, return statistics
//! and month-over-month comparisons.
//!
//! ## Core Concepts
//!
//! - **Order Record**: one sale or return line. Returns are flagged by the
//!   order status `"İade Edildi"`.
//! - **Expense Table**: marketing and operations costs per period label.
//! - **Financial Summary**: revenue (VAT inclusive and exclusive), gross and net
//!   profit, per-order charges, fixed costs and delivered/returned counts.
//! - **Selectors**: a period or channel filter, either `All` or one label.
//!   Fixed costs only count when every channel is selected.
//! - **Periods**: free-form month labels (`"2025 Ocak"`), ordered
//!   chronologically by a best-effort parser.
//!
//! ## Example
//!
//! ```rust,ignore
//! use seller_profit_analytics::*;
//!
//! let snapshot = SalesSnapshot::from_json(&std::fs::read_to_string("backup.json")?)?;
//! let dashboard = Dashboard::new(&snapshot);
//!
//! let overview = dashboard.overview(&Selector::All);
//! println!("Net profit: {:.2}", overview.summary.net_profit);
//!
//! if let Some((older, newer)) = dashboard.default_comparison_pair() {
//!     let cmp = dashboard.comparison(&older, &newer).unwrap();
//!     println!("Revenue change: {:+.2}", cmp.revenue_delta);
//! }
//! ```

pub mod comparison;
pub mod error;
pub mod filters;
pub mod ingestion;
pub mod metrics;
pub mod periods;
pub mod schema;
pub mod settings;
pub mod store;
pub mod views;

#[cfg(feature = "xlsx")]
pub mod workbook;

pub use comparison::{compare, ComparisonMetric, ComparisonResult, ComparisonRow};
pub use error::{AnalyticsError, Result};
pub use filters::{
    turkish_lowercase, ChannelSelector, PeriodSelector, RecordFilter, Selector, ALL_SENTINEL,
};
pub use ingestion::*;
pub use metrics::{reduce, FinancialSummary, VAT_DIVISOR};
pub use periods::{
    compare_periods, default_comparison_pair, distinct_periods, distinct_platforms,
    sort_periods,
};
pub use schema::*;
pub use settings::{DashboardSettings, ImportDefaults};
pub use store::{DatasetStore, DirectoryStorage, MemoryStorage, SnapshotStorage};
pub use views::*;

#[cfg(feature = "xlsx")]
pub use workbook::{read_workbook, read_workbook_from_bytes};

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Headline figures of the overview screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverviewReport {
    pub summary: FinancialSummary,
    pub channel_revenue: Vec<ChannelRevenue>,
    pub expense_breakdown: Vec<ExpenseSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelReport {
    pub summary: FinancialSummary,
    pub expense_breakdown: Vec<ExpenseSlice>,
    pub categories: Vec<CategoryStat>,
    pub returns: ReturnStats,
    pub top_products: Vec<ProductQuantity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductReport {
    pub metrics: ProductSearchMetrics,
    pub listing: ProductListing,
}

/// Read-only queries over one dataset snapshot, one per dashboard screen.
pub struct Dashboard<'a> {
    snapshot: &'a SalesSnapshot,
}

impl<'a> Dashboard<'a> {
    pub fn new(snapshot: &'a SalesSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn periods(&self) -> Vec<String> {
        distinct_periods(&self.snapshot.sales)
    }

    pub fn platforms(&self) -> Vec<String> {
        distinct_platforms(&self.snapshot.sales)
    }

    pub fn default_comparison_pair(&self) -> Option<(String, String)> {
        default_comparison_pair(&self.periods())
    }

    pub fn overview(&self, period: &PeriodSelector) -> OverviewReport {
        let filter = RecordFilter::new(period.clone(), Selector::All);
        let summary = reduce(
            filter.apply(&self.snapshot.sales),
            &self.snapshot.expenses,
            &filter.period,
            &filter.channel,
        );

        debug!(
            "Overview for period '{}': net profit {:.2}",
            period, summary.net_profit
        );

        OverviewReport {
            channel_revenue: channel_revenue(filter.apply(&self.snapshot.sales)),
            expense_breakdown: expense_breakdown(&summary),
            summary,
        }
    }

    pub fn channel_analysis(
        &self,
        period: &PeriodSelector,
        channel: &ChannelSelector,
    ) -> ChannelReport {
        let filter = RecordFilter::new(period.clone(), channel.clone());
        let sales = &self.snapshot.sales;
        let summary = reduce(
            filter.apply(sales),
            &self.snapshot.expenses,
            &filter.period,
            &filter.channel,
        );

        ChannelReport {
            expense_breakdown: channel_expense_breakdown(&summary),
            categories: category_stats(filter.apply(sales)),
            returns: return_stats(filter.apply(sales)),
            top_products: top_selling_products(filter.apply(sales)),
            summary,
        }
    }

    pub fn comparison(&self, first_period: &str, second_period: &str) -> Option<ComparisonResult> {
        compare(
            &self.snapshot.sales,
            &self.snapshot.expenses,
            first_period,
            second_period,
        )
    }

    /// Search across every channel. A blank `search` term matches everything.
    pub fn product_analysis(
        &self,
        period: &PeriodSelector,
        search: &str,
        listing_limit: usize,
    ) -> ProductReport {
        let filter = RecordFilter::new(period.clone(), Selector::All).with_search(search);
        ProductReport {
            metrics: product_search_metrics(filter.apply(&self.snapshot.sales)),
            listing: product_listing(filter.apply(&self.snapshot.sales), listing_limit),
        }
    }
}
