//! HTTP handlers, one module per API area.

pub mod data;
pub mod download_events;
pub mod events;
pub mod metadata;
pub mod settings;
