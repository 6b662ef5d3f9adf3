//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: no domain transforms.

pub mod tables;

pub use tables::{format_bytes, print_separator, truncate_string};
