//! The in-memory table and concatenation.

use std::collections::HashMap;

use drivetab_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, ColumnKind};

/// A rectangular table with named columns.
///
/// Every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Build a frame, padding short rows with [`Cell::Empty`].
    ///
    /// Rows longer than the header are rejected.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let width = columns.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(Error::spreadsheet(format!(
                    "row {i} has {} cells but there are {width} columns",
                    row.len()
                )));
            }
            row.resize(width, Cell::Empty);
            padded.push(row);
        }
        Ok(Self {
            columns,
            rows: padded,
        })
    }

    /// A frame with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Returns `true` if the frame has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Frame {
        Frame {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Position of the column called `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// The cells of column `index`, top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Classification of column `index`.
    pub fn column_kind(&self, index: usize) -> ColumnKind {
        ColumnKind::of(self.column(index))
    }

    /// Indices of the numeric columns.
    pub fn numeric_columns(&self) -> Vec<usize> {
        (0..self.columns.len())
            .filter(|&i| self.column_kind(i).is_numeric())
            .collect()
    }

    /// The numbers in column `index`, skipping anything else.
    pub fn numeric_values(&self, index: usize) -> Vec<f64> {
        self.column(index).filter_map(Cell::as_number).collect()
    }
}

/// Stack frames vertically.
///
/// The result's columns are the union of the inputs' columns in order of
/// first appearance; cells a frame does not have are [`Cell::Empty`]. Rows
/// keep the order of the frames and of the rows within them.
pub fn concat<I>(frames: I) -> Frame
where
    I: IntoIterator<Item = Frame>,
{
    let frames: Vec<Frame> = frames.into_iter().collect();

    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for frame in &frames {
        for name in &frame.columns {
            if !positions.contains_key(name) {
                positions.insert(name.clone(), columns.len());
                columns.push(name.clone());
            }
        }
    }

    let width = columns.len();
    let total: usize = frames.iter().map(|f| f.rows.len()).sum();
    let mut rows = Vec::with_capacity(total);
    for frame in frames {
        let targets: Vec<usize> = frame.columns.iter().map(|c| positions[c]).collect();
        for row in frame.rows {
            let mut out = vec![Cell::Empty; width];
            for (cell, &target) in row.into_iter().zip(&targets) {
                out[target] = cell;
            }
            rows.push(out);
        }
    }

    tracing::debug!(rows = rows.len(), columns = width, "concatenated frames");
    Frame { columns, rows }
}
