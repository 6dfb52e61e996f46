//! Workbook import (`.xlsx`, `.xls`, `.ods`). The first sheet holds order
//! lines, the optional second sheet holds fixed expenses. Row 1 of each sheet
//! is a header.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use log::{info, warn};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::error::{AnalyticsError, Result};
use crate::ingestion::{excel_serial_to_date, parse_expense_rows, parse_sales_rows, SheetCell};
use crate::schema::{ExpenseTable, SalesSnapshot};
use crate::settings::ImportDefaults;

pub fn read_workbook(path: impl AsRef<Path>, defaults: &ImportDefaults) -> Result<SalesSnapshot> {
    let path = path.as_ref();
    let workbook = open_workbook_auto(path)
        .map_err(|e| AnalyticsError::Workbook(format!("{}: {}", path.display(), e)))?;

    let snapshot = read_sheets(workbook, defaults)?;
    info!(
        "Imported {} order lines and {} expense periods from {}",
        snapshot.sales.len(),
        snapshot.expenses.len(),
        path.display()
    );
    Ok(snapshot)
}

pub fn read_workbook_from_bytes(
    bytes: Vec<u8>,
    defaults: &ImportDefaults,
) -> Result<SalesSnapshot> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AnalyticsError::Workbook(e.to_string()))?;
    read_sheets(workbook, defaults)
}

fn read_sheets<RS: Read + Seek>(
    mut workbook: Sheets<RS>,
    defaults: &ImportDefaults,
) -> Result<SalesSnapshot> {
    let names = workbook.sheet_names();

    let sales_sheet = names
        .first()
        .ok_or_else(|| AnalyticsError::Workbook("workbook has no sheets".to_string()))?;
    let sales_range = workbook
        .worksheet_range(sales_sheet)
        .map_err(|e| AnalyticsError::Workbook(format!("sheet '{}': {}", sales_sheet, e)))?;
    let sales = parse_sales_rows(sheet_rows(&sales_range), defaults);

    let expenses = match names.get(1) {
        Some(expense_sheet) => match workbook.worksheet_range(expense_sheet) {
            Ok(range) => parse_expense_rows(sheet_rows(&range)),
            Err(e) => {
                warn!("Expense sheet '{}' could not be read: {}", expense_sheet, e);
                ExpenseTable::new()
            }
        },
        None => ExpenseTable::new(),
    };

    Ok(SalesSnapshot::new(sales, expenses))
}

/// Data rows with absolute column positions; the sheet's first row is dropped.
fn sheet_rows(range: &Range<Data>) -> Vec<Vec<SheetCell>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    range
        .rows()
        .enumerate()
        .filter(|(offset, _)| start_row as usize + offset > 0)
        .map(|(_, row)| {
            let mut cells = vec![SheetCell::Empty; start_col as usize];
            cells.extend(row.iter().map(to_cell));
            cells
        })
        .collect()
}

fn to_cell(data: &Data) -> SheetCell {
    match data {
        Data::Int(i) => SheetCell::Number(*i as f64),
        Data::Float(f) => SheetCell::Number(*f),
        Data::String(s) => SheetCell::from(s.as_str()),
        Data::Bool(b) => SheetCell::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_date(serial)
                .map(SheetCell::Date)
                .unwrap_or(SheetCell::Number(serial))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => SheetCell::from(s.as_str()),
        _ => SheetCell::Empty,
    }
}
