//! Workbook fixtures for the integration tests.

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

/// A cell to place in a fixture worksheet.
#[derive(Debug, Clone)]
pub enum Fixture {
    /// Leave the cell blank.
    Blank,
    /// A number.
    Num(f64),
    /// A string.
    Str(&'static str),
    /// A boolean.
    Bool(bool),
    /// A date as `(year, month, day)`.
    Date(u16, u8, u8),
}

/// Build a single-sheet xlsx workbook from rows of fixture cells.
pub fn workbook(rows: &[Vec<Fixture>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Fixture::Blank => {}
                Fixture::Num(n) => {
                    sheet.write_number(r, c, *n).unwrap();
                }
                Fixture::Str(s) => {
                    sheet.write_string(r, c, *s).unwrap();
                }
                Fixture::Bool(b) => {
                    sheet.write_boolean(r, c, *b).unwrap();
                }
                Fixture::Date(y, m, d) => {
                    let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
                    sheet.write_datetime_with_format(r, c, &date, &date_format).unwrap();
                }
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

/// Two quarterly reports with overlapping columns.
pub fn quarterly_reports() -> (Vec<u8>, Vec<u8>) {
    use Fixture::*;
    let q1 = workbook(&[
        vec![Str("site"), Str("tx_curr"), Str("period")],
        vec![Str("Nairobi"), Num(120.0), Str("Q1")],
        vec![Str("Kisumu"), Num(80.0), Str("Q1")],
    ]);
    let q2 = workbook(&[
        vec![Str("site"), Str("period"), Str("tx_curr"), Str("tx_new")],
        vec![Str("Nairobi"), Str("Q2"), Num(130.0), Num(12.0)],
        vec![Str("Mombasa"), Str("Q2"), Num(60.0), Num(7.0)],
    ]);
    (q1, q2)
}
