//! Command handlers.

pub mod exclude;
pub mod metadata;
pub mod record;
pub mod serve;
pub mod stats;
