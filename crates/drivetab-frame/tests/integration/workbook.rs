//! Decoding workbooks.

use drivetab_frame::{Cell, read_table, read_xlsx};

use crate::common::{Fixture::*, workbook};

#[test]
fn test_header_rules() {
    let bytes = workbook(&[
        vec![Str("site"), Blank, Str("value"), Str("value")],
        vec![Str("A"), Num(1.0), Num(2.0), Num(3.0)],
    ]);
    let frame = read_xlsx(&bytes).unwrap();
    assert_eq!(
        frame.columns(),
        &["site", "Unnamed: 1", "value", "value.1"]
    );
    assert_eq!(frame.shape(), (1, 4));
}

#[test]
fn test_leading_blank_column_is_kept() {
    let bytes = workbook(&[
        vec![Blank, Str("site"), Str("n")],
        vec![Blank, Str("Mombasa"), Num(4.0)],
    ]);
    let frame = read_xlsx(&bytes).unwrap();
    assert_eq!(frame.columns(), &["Unnamed: 0", "site", "n"]);
    assert_eq!(
        frame.rows()[0],
        vec![Cell::Empty, Cell::from("Mombasa"), Cell::Number(4.0)]
    );
}

#[test]
fn test_short_rows_are_padded() {
    let bytes = workbook(&[
        vec![Str("a"), Str("b"), Str("c")],
        vec![Num(1.0)],
        vec![Num(2.0), Num(3.0), Num(4.0)],
    ]);
    let frame = read_xlsx(&bytes).unwrap();
    assert_eq!(frame.rows()[0], vec![Cell::Number(1.0), Cell::Empty, Cell::Empty]);
}

#[test]
fn test_value_types() {
    let bytes = workbook(&[
        vec![Str("when"), Str("ok"), Str("n")],
        vec![Date(2023, 3, 31), Bool(true), Num(2.5)],
    ]);
    let frame = read_xlsx(&bytes).unwrap();
    assert_eq!(
        frame.rows()[0],
        vec![
            Cell::Text("2023-03-31".into()),
            Cell::Bool(true),
            Cell::Number(2.5)
        ]
    );
}

#[test]
fn test_header_only_sheet_is_empty() {
    let bytes = workbook(&[vec![Str("a"), Str("b")]]);
    let frame = read_xlsx(&bytes).unwrap();
    assert_eq!(frame.columns(), &["a", "b"]);
    assert!(frame.is_empty());
}

#[test]
fn test_read_table_sniffs_workbooks() {
    let bytes = workbook(&[vec![Str("a")], vec![Num(1.0)]]);
    let frame = read_table("report.xlsx", &bytes).unwrap();
    assert_eq!(frame.shape(), (1, 1));
}

#[test]
fn test_corrupt_workbook_is_an_error() {
    let mut bytes = workbook(&[vec![Str("a")]]);
    bytes.truncate(bytes.len() / 2);
    assert!(read_xlsx(&bytes).is_err());
}
