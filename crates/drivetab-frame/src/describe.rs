//! Descriptive statistics over every column of a frame.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell::{Cell, ColumnKind, format_number};
use crate::distribution::{mean, quantile, sample_std, sorted_finite};
use crate::frame::Frame;

/// Statistics for one column.
///
/// Numeric columns fill the moment and quantile fields; other columns fill
/// `unique`, `top` and `freq`. Fields that do not apply are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Column name.
    pub name: String,
    /// Column classification.
    pub kind: ColumnKind,
    /// Non-empty cells.
    pub count: usize,
    /// Distinct non-empty values.
    pub unique: Option<usize>,
    /// Most frequent value; ties go to the first seen.
    pub top: Option<String>,
    /// Occurrences of `top`.
    pub freq: Option<usize>,
    /// Mean.
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std: Option<f64>,
    /// Minimum.
    pub min: Option<f64>,
    /// First quartile.
    pub q25: Option<f64>,
    /// Median.
    pub q50: Option<f64>,
    /// Third quartile.
    pub q75: Option<f64>,
    /// Maximum.
    pub max: Option<f64>,
}

impl ColumnSummary {
    fn numeric(name: &str, cells: &[&Cell]) -> Self {
        let values: Vec<f64> = cells.iter().filter_map(|c| c.as_number()).collect();
        let sorted = sorted_finite(&values);
        Self {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
            count: values.len(),
            unique: None,
            top: None,
            freq: None,
            mean: mean(&values),
            std: sample_std(&values),
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            q50: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }

    fn categorical(name: &str, kind: ColumnKind, cells: &[&Cell]) -> Self {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for cell in cells.iter().filter(|c| !c.is_empty()) {
            let key = cell.to_string();
            let entry = counts.entry(key.clone()).or_insert(0);
            if *entry == 0 {
                order.push(key);
            }
            *entry += 1;
        }

        let mut top: Option<(&String, usize)> = None;
        for key in &order {
            let n = counts[key];
            if top.is_none_or(|(_, best)| n > best) {
                top = Some((key, n));
            }
        }

        Self {
            name: name.to_string(),
            kind,
            count: order.iter().map(|k| counts[k]).sum(),
            unique: Some(order.len()),
            top: top.map(|(k, _)| k.clone()),
            freq: top.map(|(_, n)| n),
            mean: None,
            std: None,
            min: None,
            q25: None,
            q50: None,
            q75: None,
            max: None,
        }
    }

    /// Value of the statistic called `stat`, rendered for display.
    ///
    /// Statistics that do not apply render as `NaN`.
    pub fn render(&self, stat: Stat) -> String {
        let number = |v: Option<f64>| v.map(format_stat).unwrap_or_else(|| "NaN".to_string());
        match stat {
            Stat::Count => self.count.to_string(),
            Stat::Unique => self.unique.map(|u| u.to_string()).unwrap_or_else(|| "NaN".into()),
            Stat::Top => self.top.clone().unwrap_or_else(|| "NaN".into()),
            Stat::Freq => self.freq.map(|f| f.to_string()).unwrap_or_else(|| "NaN".into()),
            Stat::Mean => number(self.mean),
            Stat::Std => number(self.std),
            Stat::Min => number(self.min),
            Stat::Q25 => number(self.q25),
            Stat::Q50 => number(self.q50),
            Stat::Q75 => number(self.q75),
            Stat::Max => number(self.max),
        }
    }
}

/// Rows of the statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stat {
    /// Non-empty cells.
    Count,
    /// Distinct values.
    Unique,
    /// Most frequent value.
    Top,
    /// Frequency of the most frequent value.
    Freq,
    /// Mean.
    Mean,
    /// Standard deviation.
    Std,
    /// Minimum.
    Min,
    /// 25th percentile.
    Q25,
    /// Median.
    Q50,
    /// 75th percentile.
    Q75,
    /// Maximum.
    Max,
}

impl Stat {
    const CATEGORICAL: [Stat; 3] = [Stat::Unique, Stat::Top, Stat::Freq];
    const NUMERIC: [Stat; 7] = [
        Stat::Mean,
        Stat::Std,
        Stat::Min,
        Stat::Q25,
        Stat::Q50,
        Stat::Q75,
        Stat::Max,
    ];

    /// Row label.
    pub fn label(self) -> &'static str {
        match self {
            Stat::Count => "count",
            Stat::Unique => "unique",
            Stat::Top => "top",
            Stat::Freq => "freq",
            Stat::Mean => "mean",
            Stat::Std => "std",
            Stat::Min => "min",
            Stat::Q25 => "25%",
            Stat::Q50 => "50%",
            Stat::Q75 => "75%",
            Stat::Max => "max",
        }
    }
}

/// Statistics for a whole frame, one [`ColumnSummary`] per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    /// Per-column statistics in column order.
    pub columns: Vec<ColumnSummary>,
}

impl Summary {
    /// Statistic rows that apply to at least one column, in display order.
    ///
    /// `count` always comes first; the categorical rows appear only when a
    /// non-numeric column exists and the numeric rows only when a numeric
    /// column exists.
    pub fn stats(&self) -> Vec<Stat> {
        let has_numeric = self.columns.iter().any(|c| c.kind.is_numeric());
        let has_other = self.columns.iter().any(|c| !c.kind.is_numeric());
        let mut stats = vec![Stat::Count];
        if has_other {
            stats.extend(Stat::CATEGORICAL);
        }
        if has_numeric {
            stats.extend(Stat::NUMERIC);
        }
        stats
    }

    /// The table as rows of strings: a header row (blank corner, then column
    /// names) followed by one row per statistic.
    pub fn to_table(&self) -> Vec<Vec<String>> {
        let mut table = Vec::new();
        let mut header = vec![String::new()];
        header.extend(self.columns.iter().map(|c| c.name.clone()));
        table.push(header);
        for stat in self.stats() {
            let mut row = vec![stat.label().to_string()];
            row.extend(self.columns.iter().map(|c| c.render(stat)));
            table.push(row);
        }
        table
    }

    /// Returns `true` when there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Summarise every column of `frame`.
pub fn describe(frame: &Frame) -> Summary {
    let columns = frame
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells: Vec<&Cell> = frame.column(i).collect();
            match ColumnKind::of(cells.iter().copied()) {
                ColumnKind::Numeric => ColumnSummary::numeric(name, &cells),
                kind => ColumnSummary::categorical(name, kind, &cells),
            }
        })
        .collect();
    Summary { columns }
}

/// Format a statistic with up to six decimals, trailing zeros removed.
pub fn format_stat(v: f64) -> String {
    if !v.is_finite() {
        return format_number(v);
    }
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
