//! Core domain types, ports and services for cachewatch.
//!
//! This crate has no knowledge of storage, HTTP or process concerns. Adapters
//! (`cachewatch-db`, `cachewatch-axum`, `cachewatch-cli`) implement the ports
//! defined here and compose the services at their composition root.

#![deny(unused_crate_dependencies)]

pub mod change;
pub mod domain;
pub mod events;
pub mod paths;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use change::ChangeCounter;
pub use domain::{
    AggregationQuery, AggregationReport, DownloadEvent, ExcludedIp, HitMissTotals, IpFormatError,
    NewDownloadEvent, ServiceBytes, ServiceIpTotals, TimeWindow, aggregate, normalize_source_ip,
};
pub use events::AppEvent;
pub use paths::{PathError, data_root, database_path, database_path_in};
pub use ports::{
    AppEventEmitter, CoreError, DownloadEventRepository, ExclusionRepository, Repos,
    RepositoryError,
};
pub use services::{
    AggregationError, AggregationService, AppCore, DownloadEventService, ExclusionError,
    ExclusionService,
};
