//! Repository implementations using `SQLite`.
//!
//! These implementations encapsulate all SQL queries and database access.
//! The `SqlitePool` is confined to this module and never exposed through
//! the port trait signatures.

mod row_mappers;
mod sqlite_download_event_repository;
mod sqlite_exclusion_repository;

pub use sqlite_download_event_repository::SqliteDownloadEventRepository;
pub use sqlite_exclusion_repository::SqliteExclusionRepository;
