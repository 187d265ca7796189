//! Database layer - connection pool, migrations and repositories
//!
//! - One transaction per request: [`PgStore`] wraps it and implements the
//!   core repository traits
//! - Rely on DB constraints, map unique violations to `Duplicate`
//! - Optimistic locking through `WHERE version = $n`

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options, DEFAULT_MAX_CONNECTIONS};
pub use repos::{AccountError, AccountRepo};

use sqlx::{PgPool, Postgres, Transaction};
use studyctl_core::models::Pagination;
use studyctl_core::StoreError;

/// Unit of work over one database transaction.
///
/// Dropping a `PgStore` without calling [`PgStore::commit`] rolls the
/// transaction back.
pub struct PgStore {
    tx: Transaction<'static, Postgres>,
}

impl PgStore {
    pub async fn begin(pool: &PgPool) -> Result<Self, StoreError> {
        let tx = pool.begin().await.map_err(StoreError::backend)?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(StoreError::backend)
    }
}

/// Map a sqlx error, turning unique violations into `Duplicate`.
pub(crate) fn store_error(resource: &'static str, e: sqlx::Error) -> StoreError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return StoreError::Duplicate {
                resource,
                detail: db_err
                    .constraint()
                    .map(|c| format!("violates {}", c))
                    .unwrap_or_else(|| db_err.message().to_owned()),
            };
        }
    }
    StoreError::backend(e)
}

/// Row failed to convert into a domain value.
pub(crate) fn corrupt(resource: &'static str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        resource,
        detail: e.to_string(),
    }
}

/// Total carried by the first row of a `COUNT(*) OVER()` page.
///
/// An empty page past the first has no row to carry it; `None` tells the
/// caller to count separately.
pub(crate) fn windowed_total(first_row_total: Option<i64>, page: Pagination) -> Option<i64> {
    match first_row_total {
        Some(total) => Some(total),
        None if page.offset() == 0 => Some(0),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windowed_total_uses_first_row() {
        assert_eq!(windowed_total(Some(12), Pagination::new(2, 5)), Some(12));
    }

    #[test]
    fn empty_first_page_means_nothing_stored() {
        assert_eq!(windowed_total(None, Pagination::new(1, 5)), Some(0));
    }

    #[test]
    fn empty_page_past_the_end_needs_a_count() {
        assert_eq!(windowed_total(None, Pagination::new(9, 5)), None);
    }

    #[test]
    fn non_database_errors_are_backend_errors() {
        let err = store_error("workbook", sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn corrupt_keeps_detail() {
        let err = corrupt("problem", "bad problem_type 'kanji'");
        assert_eq!(err.to_string(), "corrupt problem row: bad problem_type 'kanji'");
    }
}
