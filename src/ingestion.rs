//! Turns spreadsheet rows into well-formed [`OrderRecord`]s and an
//! [`ExpenseTable`].
//!
//! All defaulting and numeric coercion happens here, so the aggregation code
//! never has to second-guess its input.
//!
//! Sales sheet columns, in order (A–Q): platform, order date, period, order
//! number, order status, product code, product group, product description,
//! quantity, purchase cost, order amount, commission, shipping, return
//! shipping, penalty, platform fee, order count.
//!
//! Expense sheet: period in A with marketing spend in B, period in E with
//! operations cost in F. Repeated periods are summed.

use chrono::{Days, NaiveDate};
use log::{debug, info};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::schema::lenient::{parse_number, to_count};
use crate::schema::{ExpenseTable, OrderRecord, SalesSnapshot};
use crate::settings::ImportDefaults;

const COL_PLATFORM: usize = 0;
const COL_ORDER_DATE: usize = 1;
const COL_PERIOD: usize = 2;
const COL_ORDER_NUMBER: usize = 3;
const COL_ORDER_STATUS: usize = 4;
const COL_PRODUCT_CODE: usize = 5;
const COL_PRODUCT_GROUP: usize = 6;
const COL_PRODUCT_DESCRIPTION: usize = 7;
const COL_QUANTITY: usize = 8;
const COL_PURCHASE_COST: usize = 9;
const COL_ORDER_AMOUNT: usize = 10;
const COL_COMMISSION: usize = 11;
const COL_SHIPPING: usize = 12;
const COL_RETURN_SHIPPING: usize = 13;
const COL_PENALTY: usize = 14;
const COL_PLATFORM_FEE: usize = 15;
const COL_ORDER_COUNT: usize = 16;

const COL_MARKETING_PERIOD: usize = 0;
const COL_MARKETING_AMOUNT: usize = 1;
const COL_OPERATIONS_PERIOD: usize = 4;
const COL_OPERATIONS_AMOUNT: usize = 5;

/// A single spreadsheet cell, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

static EMPTY_CELL: SheetCell = SheetCell::Empty;

impl SheetCell {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Numeric value, or zero for anything that does not read as a number.
    pub fn as_number(&self) -> f64 {
        match self {
            Self::Number(n) if n.is_finite() => *n,
            Self::Text(text) => parse_number(text),
            Self::Bool(true) => 1.0,
            _ => 0.0,
        }
    }
}

impl From<&str> for SheetCell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }
}

fn cell(row: &[SheetCell], idx: usize) -> &SheetCell {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

fn text_or(row: &[SheetCell], idx: usize, default: &str) -> String {
    let text = cell(row, idx).as_text();
    if text.is_empty() {
        default.to_string()
    } else {
        text
    }
}

/// Excel stores dates as days since 1899-12-30.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Maps one sales row to a record. Rows without any content yield `None`.
pub fn parse_sales_row(row: &[SheetCell], defaults: &ImportDefaults) -> Option<OrderRecord> {
    if row.iter().all(SheetCell::is_blank) {
        return None;
    }

    Some(OrderRecord {
        platform: text_or(row, COL_PLATFORM, &defaults.platform),
        order_date: cell(row, COL_ORDER_DATE).as_text(),
        period: cell(row, COL_PERIOD).as_text().trim().to_string(),
        order_number: cell(row, COL_ORDER_NUMBER).as_text(),
        order_status: cell(row, COL_ORDER_STATUS).as_text(),
        product_code: cell(row, COL_PRODUCT_CODE).as_text(),
        product_group: text_or(row, COL_PRODUCT_GROUP, &defaults.product_group),
        product_description: cell(row, COL_PRODUCT_DESCRIPTION).as_text(),
        quantity: to_count(cell(row, COL_QUANTITY).as_number()),
        purchase_cost: cell(row, COL_PURCHASE_COST).as_number(),
        order_amount: cell(row, COL_ORDER_AMOUNT).as_number(),
        commission: cell(row, COL_COMMISSION).as_number(),
        shipping_cost: cell(row, COL_SHIPPING).as_number(),
        return_shipping_cost: cell(row, COL_RETURN_SHIPPING).as_number(),
        penalty_fee: cell(row, COL_PENALTY).as_number(),
        platform_fee: cell(row, COL_PLATFORM_FEE).as_number(),
        order_count: to_count(cell(row, COL_ORDER_COUNT).as_number()),
    })
}

/// Parses sales data rows (header already removed).
pub fn parse_sales_rows<I, R>(rows: I, defaults: &ImportDefaults) -> Vec<OrderRecord>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[SheetCell]>,
{
    let mut skipped = 0usize;
    let records: Vec<OrderRecord> = rows
        .into_iter()
        .filter_map(|row| {
            let parsed = parse_sales_row(row.as_ref(), defaults);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    if skipped > 0 {
        debug!("Skipped {} blank sales rows", skipped);
    }
    records
}

/// Parses expense data rows (header already removed).
pub fn parse_expense_rows<I, R>(rows: I) -> ExpenseTable
where
    I: IntoIterator<Item = R>,
    R: AsRef<[SheetCell]>,
{
    let mut table = ExpenseTable::new();

    for row in rows {
        let row = row.as_ref();

        let marketing_period = cell(row, COL_MARKETING_PERIOD).as_text();
        let marketing_period = marketing_period.trim();
        if !marketing_period.is_empty() {
            table.add_marketing(marketing_period, cell(row, COL_MARKETING_AMOUNT).as_number());
        }

        let operations_period = cell(row, COL_OPERATIONS_PERIOD).as_text();
        let operations_period = operations_period.trim();
        if !operations_period.is_empty() {
            table.add_operations(
                operations_period,
                cell(row, COL_OPERATIONS_AMOUNT).as_number(),
            );
        }
    }

    table
}

fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<Vec<SheetCell>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(SheetCell::from).collect());
    }
    Ok(rows)
}

/// Reads a CSV export of the sales sheet. The first line is a header.
pub fn read_sales_csv<R: Read>(reader: R, defaults: &ImportDefaults) -> Result<Vec<OrderRecord>> {
    let rows = read_csv_rows(reader)?;
    Ok(parse_sales_rows(&rows, defaults))
}

/// Reads a CSV export of the expense sheet. The first line is a header.
pub fn read_expenses_csv<R: Read>(reader: R) -> Result<ExpenseTable> {
    let rows = read_csv_rows(reader)?;
    Ok(parse_expense_rows(&rows))
}

/// Imports a sales CSV and, optionally, an expense CSV into one snapshot.
pub fn import_csv_files(
    sales_path: impl AsRef<Path>,
    expenses_path: Option<&Path>,
    defaults: &ImportDefaults,
) -> Result<SalesSnapshot> {
    let sales_path = sales_path.as_ref();
    let sales = read_sales_csv(File::open(sales_path)?, defaults)?;

    let expenses = match expenses_path {
        Some(path) => read_expenses_csv(File::open(path)?)?,
        None => ExpenseTable::new(),
    };

    info!(
        "Imported {} order lines and {} expense periods from {}",
        sales.len(),
        expenses.len(),
        sales_path.display()
    );

    Ok(SalesSnapshot::new(sales, expenses))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<SheetCell> {
        cells.iter().map(|c| SheetCell::from(*c)).collect()
    }

    #[test]
    fn test_cell_coercion() {
        assert_eq!(SheetCell::Text(" 12.5 ".to_string()).as_number(), 12.5);
        assert_eq!(SheetCell::Text("1.234,56".to_string()).as_number(), 0.0);
        assert_eq!(SheetCell::Text("abc".to_string()).as_number(), 0.0);
        assert_eq!(SheetCell::Number(f64::NAN).as_number(), 0.0);
        assert_eq!(SheetCell::Bool(true).as_number(), 1.0);
        assert_eq!(SheetCell::Empty.as_number(), 0.0);

        assert_eq!(SheetCell::Number(4512.0).as_text(), "4512");
        assert_eq!(SheetCell::Number(2.5).as_text(), "2.5");
        assert!(SheetCell::Text("  ".to_string()).is_blank());
    }

    #[test]
    fn test_excel_serial_to_date() {
        assert_eq!(
            excel_serial_to_date(45658.0),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(excel_serial_to_date(-1.0), None);
    }

    #[test]
    fn test_parse_sales_row_maps_columns() {
        let row = vec![
            SheetCell::Text("Trendyol".to_string()),
            SheetCell::Date(NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()),
            SheetCell::Text(" 2025 Ocak ".to_string()),
            SheetCell::Number(10045.0),
            SheetCell::Text("Teslim Edildi".to_string()),
            SheetCell::Text("KZK-01".to_string()),
            SheetCell::Empty,
            SheetCell::Text("Yün Kazak".to_string()),
            SheetCell::Number(2.0),
            SheetCell::Number(300.0),
            SheetCell::Number(720.0),
            SheetCell::Number(-86.4),
            SheetCell::Text("-35".to_string()),
            SheetCell::Empty,
            SheetCell::Text("x".to_string()),
            SheetCell::Number(-4.5),
            SheetCell::Empty,
        ];

        let record = parse_sales_row(&row, &ImportDefaults::default()).unwrap();
        assert_eq!(record.platform, "Trendyol");
        assert_eq!(record.order_date, "2025-01-14");
        assert_eq!(record.period, "2025 Ocak");
        assert_eq!(record.order_number, "10045");
        assert_eq!(record.product_group, "General");
        assert_eq!(record.quantity, 2);
        assert_eq!(record.purchase_cost, 300.0);
        assert_eq!(record.order_amount, 720.0);
        assert_eq!(record.commission, -86.4);
        assert_eq!(record.shipping_cost, -35.0);
        assert_eq!(record.return_shipping_cost, 0.0);
        assert_eq!(record.penalty_fee, 0.0);
        assert_eq!(record.platform_fee, -4.5);
        assert_eq!(record.order_count, 0);
        assert_eq!(record.effective_order_count(), 1);
    }

    #[test]
    fn test_short_and_blank_rows() {
        let rows = vec![
            text_row(&["", "", ""]),
            text_row(&["", "", "2025 Şubat", "", "İade Edildi"]),
        ];
        let records = parse_sales_rows(&rows, &ImportDefaults::default());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].platform, "Other");
        assert_eq!(records[0].period, "2025 Şubat");
        assert!(records[0].is_return());
        assert_eq!(records[0].order_amount, 0.0);
    }

    #[test]
    fn test_parse_expense_rows_sums_repeated_periods() {
        let rows = vec![
            text_row(&["2025 Ocak", "1000", "", "", "2025 Ocak", "5000"]),
            text_row(&["2025 Ocak", "250", "", "", "2025 Şubat", "5000"]),
            text_row(&["", "999", "", "", "", ""]),
            text_row(&["2025 Mart", "abc"]),
        ];

        let table = parse_expense_rows(&rows);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("2025 Ocak").unwrap().marketing, 1250.0);
        assert_eq!(table.get("2025 Ocak").unwrap().operations, 5000.0);
        assert_eq!(table.get("2025 Şubat").unwrap().marketing, 0.0);
        assert_eq!(table.get("2025 Şubat").unwrap().operations, 5000.0);
        assert_eq!(table.get("2025 Mart").unwrap().marketing, 0.0);
    }

    #[test]
    fn test_read_sales_csv() {
        let csv = "Platform,Tarih,Ay,No,Durum,Kod,Grup,Aciklama,Adet,Alis,Tutar,Komisyon,Kargo,IadeKargo,Ceza,PlatformGideri,SiparisSayisi\n\
                   Web,2025-01-03,2025 Ocak,1,Teslim Edildi,K1,Giyim,Kazak,1,50,120,0,0,0,0,0,1\n\
                   ,,,,,,,,,,,,,,,,\n\
                   Trendyol,2025-02-03,2025 Şubat,2,İade Edildi,K1,Giyim,Kazak,1,50,120,-10\n";

        let records = read_sales_csv(csv.as_bytes(), &ImportDefaults::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].order_amount, 120.0);
        assert_eq!(records[0].order_count, 1);
        assert!(records[1].is_return());
        assert_eq!(records[1].commission, -10.0);
        assert_eq!(records[1].platform_fee, 0.0);
    }

    #[test]
    fn test_read_expenses_csv() {
        let csv = "Ay,Reklam,,,Ay,Isletme\n2025 Ocak,25000,,,2025 Ocak,150000\n";
        let table = read_expenses_csv(csv.as_bytes()).unwrap();
        let jan = table.get("2025 Ocak").unwrap();
        assert_eq!(jan.marketing, 25000.0);
        assert_eq!(jan.operations, 150000.0);
    }
}
