//! # Encore Common Library
//!
//! Shared code for the encore sync tools:
//! - Error and result types
//! - TOML configuration model and config file discovery
//! - Data root resolution and storage layout

pub mod config;
pub mod error;
pub mod layout;

pub use error::{Error, Result};
pub use layout::StorageLayout;
