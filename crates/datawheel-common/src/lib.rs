//! Datawheel Common - Shared types and utilities
//!
//! This crate provides the roster and group types, error definitions,
//! configuration structures and name-list parsing used across all
//! Datawheel components.

pub mod config;
pub mod error;
pub mod parse;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use parse::{TeamCodes, parse_names};
pub use types::*;
