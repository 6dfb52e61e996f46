use seller_profit_analytics::*;
use std::path::Path;

fn sample_dataset() -> SalesSnapshot {
    let kazak = ("KZK-01", "Giyim", "Yün Kazak");
    let atki = ("ATK-02", "Aksesuar", "Kaşmir Atkı");
    let canta = ("CNT-03", "Aksesuar", "Deri Çanta");

    let rows = [
        ("Trendyol", "2025 Ocak", "Teslim Edildi", kazak, 2, 1500.0, 600.0),
        ("Trendyol", "2025 Ocak", RETURNED_STATUS, kazak, 1, 750.0, 300.0),
        ("Hepsiburada", "2025 Ocak", "Teslim Edildi", atki, 4, 1200.0, 320.0),
        ("Web", "2025 Şubat", "Teslim Edildi", canta, 1, 2400.0, 900.0),
        ("Trendyol", "2025 Şubat", "Teslim Edildi", atki, 6, 1800.0, 480.0),
        ("Hepsiburada", "2025 Şubat", RETURNED_STATUS, canta, 1, 2400.0, 900.0),
    ];

    let sales = rows
        .iter()
        .map(
            |&(platform, period, status, (code, group, description), quantity, amount, cost)| {
                OrderRecord {
                    platform: platform.to_string(),
                    period: period.to_string(),
                    order_status: status.to_string(),
                    product_code: code.to_string(),
                    product_group: group.to_string(),
                    product_description: description.to_string(),
                    quantity,
                    order_amount: amount,
                    purchase_cost: cost,
                    commission: -(amount * 0.12),
                    shipping_cost: -45.0,
                    ..Default::default()
                }
            },
        )
        .collect();

    let expenses = [
        ("2025 Ocak", 500.0, 1500.0),
        ("2025 Şubat", 650.0, 1500.0),
    ]
    .into_iter()
    .map(|(period, marketing, operations)| {
        (
            period.to_string(),
            FixedExpense {
                marketing,
                operations,
            },
        )
    })
    .collect();

    SalesSnapshot::new(sales, expenses)
}

fn main() -> anyhow::Result<()> {
    // An optional CSV export of the sales sheet replaces the built-in sample.
    let snapshot = match std::env::args().nth(1) {
        Some(path) => import_csv_files(Path::new(&path), None, &ImportDefaults::default())?,
        None => sample_dataset(),
    };

    let mut store = DatasetStore::open(
        MemoryStorage::new(),
        &DashboardSettings::default(),
        SalesSnapshot::default(),
    )?;
    store.replace(snapshot)?;

    let dashboard = Dashboard::new(store.dataset());

    println!("📊 Seller Profit Report\n");
    for period in dashboard.periods() {
        let overview = dashboard.overview(&Selector::only(period.as_str()));
        let s = &overview.summary;
        println!("{}", period);
        println!("  Revenue (inc. VAT): {:>12.2}", s.revenue_inc_vat);
        println!("  Revenue (ex. VAT):  {:>12.2}", s.revenue_ex_vat);
        println!("  Gross profit:       {:>12.2}", s.gross_profit);
        println!("  Net profit:         {:>12.2}", s.net_profit);
        println!("  Return rate:        {:>11.1}%", s.return_rate_percent());
        for channel in &overview.channel_revenue {
            println!("    {:<14} {:>10.2}", channel.platform, channel.revenue);
        }
        println!();
    }

    println!("Channel breakdown (all periods)");
    for platform in dashboard.platforms() {
        let report = dashboard.channel_analysis(&Selector::All, &Selector::only(platform.as_str()));
        println!("  {}", platform);
        for slice in &report.expense_breakdown {
            println!("    {:<22} {:>10.2}", slice.bucket.label(), slice.value);
        }
    }
    println!();

    if let Some((first, second)) = dashboard.default_comparison_pair() {
        if let Some(result) = dashboard.comparison(&first, &second) {
            println!("{} vs {}", first, second);
            for row in &result.chart {
                println!(
                    "  {:<12} {:>10.2} {:>10.2}",
                    row.metric.label(),
                    row.first,
                    row.second
                );
            }
            println!("  Revenue change:    {:+.2}", result.revenue_delta);
            println!("  Net profit change: {:+.2}", result.net_profit_delta);
            println!("  Order change:      {:+}", result.order_count_delta);
        }
    }

    let search = dashboard.product_analysis(&Selector::All, "atkı", 50);
    println!(
        "\nSearch 'atkı': {} lines, {} units delivered, {} returned",
        search.listing.total_matches,
        search.metrics.delivered_quantity,
        search.metrics.returned_quantity
    );

    Ok(())
}
