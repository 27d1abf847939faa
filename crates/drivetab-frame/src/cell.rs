//! Cell values and column classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    /// No value.
    #[default]
    Empty,
    /// Any numeric value; integers are stored exactly up to 2^53.
    Number(f64),
    /// Text, including dates rendered as ISO 8601.
    Text(String),
    /// Boolean.
    Bool(bool),
}

impl Cell {
    /// Returns `true` for [`Cell::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Parse a field read from delimited text.
    ///
    /// Empty fields become [`Cell::Empty`], numbers [`Cell::Number`] and
    /// `True`/`False` (any case) [`Cell::Bool`].
    pub fn parse(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>()
            && n.is_finite()
        {
            return Cell::Number(n);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => Cell::Bool(true),
            "false" => Cell::Bool(false),
            _ => Cell::Text(field.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => f.write_str(s),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

/// Format a number the way it is shown in tables and exports.
///
/// Integral values print without a fractional part; NaN prints as `NaN`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// Classification of a column by the values it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every non-empty cell is a number (or there are none).
    Numeric,
    /// Every non-empty cell is a boolean.
    Boolean,
    /// Anything else.
    Text,
}

impl ColumnKind {
    /// Classify a sequence of cells.
    pub fn of<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut numbers = 0usize;
        let mut bools = 0usize;
        let mut other = 0usize;
        for cell in cells {
            match cell {
                Cell::Empty => {}
                Cell::Number(_) => numbers += 1,
                Cell::Bool(_) => bools += 1,
                Cell::Text(_) => other += 1,
            }
        }
        match (numbers, bools, other) {
            (_, 0, 0) => ColumnKind::Numeric,
            (0, _, 0) => ColumnKind::Boolean,
            _ => ColumnKind::Text,
        }
    }

    /// Returns `true` for [`ColumnKind::Numeric`].
    pub fn is_numeric(self) -> bool {
        self == ColumnKind::Numeric
    }
}
