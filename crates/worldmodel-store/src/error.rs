//! Error type shared by all world model stores.

use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, WorldModelError>;

/// Errors that can arise from world model persistence operations.
///
/// Database-level failures surface unchanged; this layer adds no retry
/// or translation. Not-found conditions are *not* errors – they come
/// back as `None`, an empty `Vec`, or `false` from the store methods.
#[derive(Error, Debug)]
pub enum WorldModelError {
    /// A statement failed (constraint violation, type mismatch,
    /// connectivity loss mid-operation).
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A connection could not be borrowed from the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The pool itself could not be built from the configuration.
    #[error("failed to create connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A field name is not a column of the target table. Field names are
    /// validated against a fixed per-table allow-list before any
    /// statement text is built.
    #[error("column {column:?} is not part of table {table}")]
    UnknownColumn {
        table: &'static str,
        column: String,
    },

    /// The entity had no fields left after stripping the identity
    /// column; there is nothing to persist.
    #[error("entity has no fields to persist into table {table}")]
    EmptyEntity { table: &'static str },

    /// A timestamp field was supplied with a non-numeric value.
    /// Timestamp columns take Unix epoch seconds as `FieldValue::Real`
    /// or, for whole seconds, `FieldValue::Int`.
    #[error("timestamp field {column:?} requires a numeric epoch-seconds value")]
    InvalidTimestamp { column: String },
}
