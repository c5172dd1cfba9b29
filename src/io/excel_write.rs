use std::path::Path;

use rust_xlsxwriter::{Format, Table, Workbook, Worksheet};

use crate::error::Result;
use crate::model::{Cell, ConsolidatedRow, OUTPUT_HEADERS};

/// Name of the single worksheet in the consolidated workbook.
pub const OUTPUT_SHEET: &str = "Consolidated";

const DATE_FORMAT: &str = "yyyy-mm-dd";

/// Writes the consolidated rows to `path`, replacing any existing file.
pub fn write_rows(path: &Path, rows: &[ConsolidatedRow]) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_FORMAT);

    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(OUTPUT_SHEET)?;

    for (col_idx, header) in OUTPUT_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, *header)?;
    }

    for (row_idx, row) in rows.iter().enumerate() {
        let excel_row = (row_idx + 1) as u32;
        worksheet.write_string(excel_row, 0, &row.account)?;
        worksheet.write_string(excel_row, 1, &row.entity)?;
        worksheet.write_string(excel_row, 2, &row.department)?;
        write_date(worksheet, excel_row, 3, &row.date, &date_format)?;
        worksheet.write_number(excel_row, 4, row.value)?;
        worksheet.write_string(excel_row, 5, &row.source_file)?;
        worksheet.write_string(excel_row, 6, &row.source_sheet)?;
    }

    // Excel tables need at least one data row below the header.
    if !rows.is_empty() {
        let mut excel_table = Table::new();
        excel_table.set_autofilter(true);
        let col_end = (OUTPUT_HEADERS.len() as u16).saturating_sub(1);
        worksheet.add_table(0, 0, rows.len() as u32, col_end, &excel_table)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

/// Writes the Date cell as read; serials keep their value and only gain a
/// display format.
fn write_date(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    date: &Cell,
    date_format: &Format,
) -> Result<()> {
    match date {
        Cell::Empty => {}
        Cell::Number(value) => {
            worksheet.write_number(row, col, *value)?;
        }
        Cell::Text(value) => {
            worksheet.write_string(row, col, value)?;
        }
        Cell::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        Cell::Date(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
    }
    Ok(())
}
