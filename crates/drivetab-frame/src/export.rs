//! Writing frames out as CSV or XLSX.

use drivetab_core::{Error, Result};
use rust_xlsxwriter::{Workbook, XlsxError};

use crate::cell::Cell;
use crate::frame::Frame;

/// MIME type for CSV downloads.
pub const CSV_MIME: &str = "text/csv";

/// MIME type for XLSX downloads.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Largest row index a worksheet accepts (zero-based).
const XLSX_MAX_ROW: usize = 1_048_575;

/// Largest column index a worksheet accepts (zero-based).
const XLSX_MAX_COL: usize = 16_383;

/// Encode `frame` as UTF-8 CSV: a header row, then one line per row.
///
/// Empty cells are written as empty fields; there is no index column.
pub fn to_csv(frame: &Frame) -> Result<Vec<u8>> {
    if frame.columns().is_empty() {
        return Ok(Vec::new());
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_err = |e: csv::Error| Error::export(format!("csv write failed: {e}"));

    writer.write_record(frame.columns()).map_err(csv_err)?;
    for row in frame.rows() {
        writer
            .write_record(row.iter().map(Cell::to_string))
            .map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::export(format!("csv flush failed: {}", e.error())))
}

/// Encode `frame` as a single-sheet XLSX workbook.
///
/// The first row holds the column names; numbers and booleans keep their
/// types and empty cells are left blank.
pub fn to_xlsx(frame: &Frame) -> Result<Vec<u8>> {
    let (rows, cols) = frame.shape();
    if rows > XLSX_MAX_ROW {
        return Err(Error::export(format!(
            "{rows} rows exceed the worksheet limit of {XLSX_MAX_ROW}"
        )));
    }
    if cols > XLSX_MAX_COL + 1 {
        return Err(Error::export(format!(
            "{cols} columns exceed the worksheet limit of {}",
            XLSX_MAX_COL + 1
        )));
    }

    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, frame).map_err(xlsx_err)?;
    workbook.save_to_buffer().map_err(xlsx_err)
}

fn write_sheet(workbook: &mut Workbook, frame: &Frame) -> std::result::Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (c, name) in frame.columns().iter().enumerate() {
        sheet.write_string(0, c as u16, name.as_str())?;
    }
    for (r, row) in frame.rows().iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Number(n) if n.is_finite() => {
                    sheet.write_number(r, c, *n)?;
                }
                Cell::Number(n) => {
                    sheet.write_string(r, c, crate::cell::format_number(*n))?;
                }
                Cell::Text(s) => {
                    sheet.write_string(r, c, s.as_str())?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
            }
        }
    }
    Ok(())
}

fn xlsx_err(e: XlsxError) -> Error {
    Error::export(format!("xlsx write failed: {e}"))
}
