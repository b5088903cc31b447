//! # Database Error Types

use thiserror::Error;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Database error type for the terminal store.
///
/// Storage I/O failure during sale entry is fatal to the originating
/// operation: callers must propagate it rather than acknowledge the sale.
#[derive(Debug, Error)]
pub enum DbError {
    /// Underlying sqlx failure (I/O, constraint, decode).
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration failed to apply.
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Could not open or create the database file.
    #[error("Failed to open database at {path}: {message}")]
    Connection { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlx_error_converts() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Sqlx(_)));
    }
}
