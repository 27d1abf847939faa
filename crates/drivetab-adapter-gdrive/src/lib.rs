//! Google Drive source for drivetab.
//!
//! [`DriveApi`] is the seam between the search logic and the network:
//! [`DriveClient`] implements it over the Drive v3 REST API, tests use an
//! in-memory fake. On top of it sit [`list_folders`], the recursive
//! [`find_files`] walk and [`load_files`], which downloads and decodes the
//! matches.

#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod load;
pub mod search;

pub use api::{DriveApi, children_query, folders_query};
pub use client::DriveClient;
pub use load::{LoadReport, LoadWarning, LoadedFile, SearchOutcome, load_files, run_search};
pub use search::{find_files, list_folders};
