//! Tabular datasets for drivetab.
//!
//! A [`Frame`] is a small in-memory table of [`Cell`]s decoded from
//! spreadsheet files. Frames from several files are stacked with
//! [`concat`], summarised with [`describe`], plotted with
//! [`plot::render_distribution`] and written back out with [`export`].

#![forbid(unsafe_code)]

pub mod cell;
pub mod describe;
pub mod distribution;
pub mod export;
pub mod frame;
pub mod plot;
pub mod read;

#[cfg(test)]
mod proptests;

pub use cell::{Cell, ColumnKind};
pub use describe::{ColumnSummary, Stat, Summary, describe};
pub use distribution::{BoxStats, Histogram, Kde, quantile};
pub use frame::{Frame, concat};
pub use read::{read_csv, read_table, read_xlsx};
