//! Core services - the application's business logic layer.
//!
//! Services orchestrate between ports (trait interfaces) and domain logic.
//! They don't know about concrete implementations.

mod aggregation_service;
mod app_core;
mod download_event_service;
mod exclusion_service;

pub use aggregation_service::{AggregationError, AggregationService};
pub use app_core::AppCore;
pub use download_event_service::DownloadEventService;
pub use exclusion_service::{ExclusionError, ExclusionService};
