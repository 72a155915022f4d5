//! Shared helpers for Diesel repository implementations.
//!
//! This module provides common utilities for database access including:
//! - Classification of Diesel errors into the cases repositories care about
//! - Revision and count casts between database and domain types
//! - Collection of row conversion results

use tracing::debug;

use super::pool::PoolError;

/// Extract a readable message from a pool error.
pub fn pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Diesel failure reduced to what a repository needs to decide on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DieselFailure {
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// The connection dropped mid-operation.
    Connection(&'static str),
    /// Anything else.
    Query(&'static str),
}

/// Classify `error`, emitting debug context for the failed operation.
pub fn classify_diesel_error(error: diesel::result::Error, operation: &'static str) -> DieselFailure {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, operation, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            operation,
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DieselFailure::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DieselFailure::Connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => DieselFailure::Query("database error"),
        _ => DieselFailure::Query("database error"),
    }
}

/// Cast database revision (i32) to domain revision (u32).
///
/// Revisions are always positive, enforced by a check constraint.
#[expect(
    clippy::cast_sign_loss,
    reason = "revision is always positive in database"
)]
pub fn cast_revision(revision: i32) -> u32 {
    revision as u32
}

/// Convert a domain revision (u32) to the database revision (i32).
///
/// Fails for revisions beyond `i32::MAX` instead of wrapping into negative
/// values the column's check constraint would reject.
pub fn cast_revision_for_db(revision: u32) -> Result<i32, String> {
    i32::try_from(revision)
        .map_err(|_| format!("revision {revision} exceeds the storable range"))
}

/// Cast a `COUNT(*)` result to an unsigned total.
#[expect(
    clippy::cast_sign_loss,
    reason = "row counts are never negative"
)]
pub fn cast_count(count: i64) -> u64 {
    count as u64
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}
