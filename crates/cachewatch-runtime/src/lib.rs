//! Long-running background tasks.
//!
//! The only task today is the [`RefreshCoordinator`], which turns change
//! counter movement into at most one refresh hint per interval.

#![deny(unsafe_code)]

pub mod refresh;

pub use refresh::{RefreshConfig, RefreshCoordinator};
pub use tokio_util::sync::CancellationToken;
