//! drivetab core: shared types, configuration, and errors.
//!
//! This crate has no internal drivetab dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: TOML configuration with environment overrides
//! - [`types`]: Drive records and the search filter
//! - [`text`]: Markup escaping

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigManager, DrivetabConfig};
pub use error::{Error, Result};
pub use types::{DriveItem, FolderEntry, FoundFile, SearchRequest};
