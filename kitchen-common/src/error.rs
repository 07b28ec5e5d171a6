//! Common error types for the kitchen service

use thiserror::Error;

/// Common result type for kitchen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the store and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A schema migration step failed; startup must abort
    #[error("Migration v{version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The operation is blocked by dependent rows or a uniqueness rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A catalog rename collides with another entry and the caller did not
    /// confirm the merge
    #[error("\"{target_name}\" already exists (id {target_id}); confirm merge to consolidate")]
    MergeConfirmationRequired { target_id: i64, target_name: String },

    /// Ingredient names in a recipe block that matched no catalog entry
    #[error("Unknown ingredients: {}", .0.join(", "))]
    MissingIngredients(Vec<String>),
}

impl Error {
    /// Maps a UNIQUE constraint violation to [`Error::Conflict`] with the
    /// given message, passing every other error through unchanged.
    pub fn unique_conflict(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Conflict(message.into())
            }
            _ => Error::Database(err),
        }
    }
}
