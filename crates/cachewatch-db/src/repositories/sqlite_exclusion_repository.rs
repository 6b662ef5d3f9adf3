//! `SQLite` implementation of the exclusion registry.

use async_trait::async_trait;
use cachewatch_core::{ExcludedIp, ExclusionRepository, RepositoryError};
use chrono::Utc;
use sqlx::SqlitePool;

use super::row_mappers::storage;

/// `SQLite` implementation of the `ExclusionRepository` trait.
///
/// The `UNIQUE` constraint on `ip_address` is what makes concurrent adds of
/// the same address safe: exactly one insert wins.
pub struct SqliteExclusionRepository {
    pool: SqlitePool,
}

impl SqliteExclusionRepository {
    /// Create a new `SQLite` exclusion repository.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

#[async_trait]
impl ExclusionRepository for SqliteExclusionRepository {
    async fn list(&self) -> Result<Vec<ExcludedIp>, RepositoryError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT ip_address FROM excluded_ips ORDER BY ip_address")
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;

        Ok(rows
            .into_iter()
            .map(|(ip,)| ExcludedIp::from_stored(ip))
            .collect())
    }

    async fn contains(&self, ip: &ExcludedIp) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM excluded_ips WHERE ip_address = ?")
            .bind(ip.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        Ok(row.is_some())
    }

    async fn insert(&self, ip: &ExcludedIp) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO excluded_ips (ip_address, created_at) VALUES (?, ?)")
            .bind(ip.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::AlreadyExists(ip.to_string())
                } else {
                    storage(e)
                }
            })?;

        Ok(())
    }

    async fn delete(&self, ip: &ExcludedIp) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM excluded_ips WHERE ip_address = ?")
            .bind(ip.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(ip.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;

    fn ip(raw: &str) -> ExcludedIp {
        ExcludedIp::parse(raw).unwrap()
    }

    async fn repo() -> SqliteExclusionRepository {
        SqliteExclusionRepository::new(setup_test_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let repo = repo().await;

        repo.insert(&ip("10.0.0.9")).await.unwrap();
        repo.insert(&ip("10.0.0.2")).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![ip("10.0.0.2"), ip("10.0.0.9")]);
        assert!(repo.contains(&ip("10.0.0.2")).await.unwrap());
        assert!(!repo.contains(&ip("10.0.0.3")).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_already_exists() {
        let repo = repo().await;

        repo.insert(&ip("192.168.1.5")).await.unwrap();
        let err = repo.insert(&ip("192.168.1.5")).await.unwrap_err();

        assert!(matches!(err, RepositoryError::AlreadyExists(ref s) if s == "192.168.1.5"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let repo = repo().await;

        let err = repo.delete(&ip("172.16.0.1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let repo = repo().await;

        repo.insert(&ip("172.16.0.1")).await.unwrap();
        repo.delete(&ip("172.16.0.1")).await.unwrap();

        assert!(repo.list().await.unwrap().is_empty());
    }
}
