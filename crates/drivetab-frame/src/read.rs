//! Decoding spreadsheet files into frames.
//!
//! The first worksheet is read. Its first non-empty row is the header:
//! blank header cells become `Unnamed: <position>` and repeated names get
//! `.1`, `.2`, ... suffixes. Short rows are padded and trailing empty rows
//! dropped.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx, open_workbook_auto_from_rs, open_workbook_from_rs};
use chrono::Timelike;
use drivetab_core::{Error, Result};

use crate::cell::Cell;
use crate::frame::Frame;

/// Decode an Excel 2007+ workbook.
pub fn read_xlsx(bytes: &[u8]) -> Result<Frame> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::spreadsheet(format!("not a readable xlsx workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::spreadsheet("workbook has no worksheets"))?
        .map_err(|e| Error::spreadsheet(format!("first worksheet unreadable: {e}")))?;
    frame_from_range(&range)
}

/// Decode comma-separated text with a header row.
pub fn read_csv(bytes: &[u8]) -> Result<Frame> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::spreadsheet(format!("invalid csv: {e}")))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }
    frame_from_rows(rows)
}

/// Decode a file by its name's extension.
///
/// `.csv` is read as text; everything else (`.xlsx`, `.xlsm`, `.xlsb`,
/// `.xls`, `.ods`) is sniffed as a workbook.
pub fn read_table(file_name: &str, bytes: &[u8]) -> Result<Frame> {
    if file_name.to_ascii_lowercase().ends_with(".csv") {
        return read_csv(bytes);
    }
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| Error::spreadsheet(format!("not a readable workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::spreadsheet("workbook has no worksheets"))?
        .map_err(|e| Error::spreadsheet(format!("first worksheet unreadable: {e}")))?;
    frame_from_range(&range)
}

fn frame_from_range(range: &Range<Data>) -> Result<Frame> {
    // The range starts at the first used cell; columns count from A.
    let leading = range.start().map_or(0, |(_, col)| col as usize);
    let rows = range
        .rows()
        .map(|row| {
            let mut cells = vec![Cell::Empty; leading];
            cells.extend(row.iter().map(cell_from_data));
            cells
        })
        .collect();
    frame_from_rows(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) if dt.is_duration() => Cell::Number(dt.as_f64()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) if ts.time().num_seconds_from_midnight() == 0 && ts.nanosecond() == 0 => {
                Cell::Text(ts.format("%Y-%m-%d").to_string())
            }
            Some(ts) => Cell::Text(ts.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(calamine::CellErrorType::NA) => Cell::Empty,
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

fn frame_from_rows(rows: Vec<Vec<Cell>>) -> Result<Frame> {
    let mut rows = rows.into_iter().skip_while(|row| row.iter().all(Cell::is_empty));
    let Some(header) = rows.next() else {
        return Ok(Frame::empty());
    };

    let mut body: Vec<Vec<Cell>> = rows.collect();
    while body.last().is_some_and(|row| row.iter().all(Cell::is_empty)) {
        body.pop();
    }

    let width = body.iter().map(Vec::len).max().unwrap_or(0).max(header.len());
    let mut header = header;
    header.resize(width, Cell::Empty);
    Frame::new(header_names(&header), body)
}

/// Column names from header cells.
pub fn header_names(cells: &[Cell]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(cells.len());

    for (i, cell) in cells.iter().enumerate() {
        let base = if cell.is_empty() {
            format!("Unnamed: {i}")
        } else {
            cell.to_string()
        };
        let mut name = base.clone();
        while used.contains(&name) {
            let suffix = next_suffix.entry(base.clone()).or_insert(0);
            *suffix += 1;
            name = format!("{base}.{suffix}");
        }
        used.insert(name.clone());
        names.push(name);
    }
    names
}
