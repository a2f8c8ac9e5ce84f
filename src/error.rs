//! Application-wide error types.
//!
//! Library modules return [`Error`] through the [`Result`] alias, while the
//! CLI and `main` use `anyhow` for convenient propagation and reporting.
//!
//! # Design
//!
//! - [`Error`]: top-level error enum; every import or chart failure ends here
//! - Subsystem errors ([`SourceError`], [`ConfigError`]) convert via `#[from]`
//! - Nothing is retried: callers decide how to present the failure
//!
//! # Example
//!
//! ```ignore
//! use scrobble_charts::error::{Error, Result};
//!
//! async fn chart(conn: &mut SqliteConnection) -> Result<()> {
//!     let import = db::find_year_import(conn, "alice", 2024)
//!         .await?
//!         .ok_or(Error::NoImportForYear { user: "alice".into(), year: 2024 })?;
//!     Ok(())
//! }
//! ```

use crate::config::ConfigError;
use crate::source::SourceError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A chart was requested before anything was imported for the user and year.
    #[error("No data imported for {user} in {year}")]
    NoImportForYear { user: String, year: i32 },

    /// The requested week is not fully inside the imported range.
    #[error("Week {week} of {year} is not fully imported for {user}")]
    IncompleteWeekCoverage { user: String, year: i32, week: u32 },

    /// The imported range does not span the whole ISO year.
    #[error("Not enough data imported for {user} in {year}")]
    IncompleteYearCoverage { user: String, year: i32 },

    /// The year has no completed ISO week yet, so there is nothing to import.
    #[error("No completed week to import for {year}")]
    EmptyImportWindow { year: i32 },

    /// Week number outside the ISO weeks of the year.
    #[error("{year} has no ISO week {week}")]
    InvalidWeek { year: i32, week: u32 },

    /// The remote play history could not be fetched.
    #[error("Remote source failure: {0}")]
    RemoteSource(#[from] SourceError),

    /// A unique key was violated while creating an entity.
    #[error("Constraint violation on {entity} '{key}'")]
    ConstraintViolation { entity: &'static str, key: String },

    /// The import was cancelled before it could commit.
    #[error("Import cancelled")]
    Cancelled,

    /// A stored timestamp is outside the representable range.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a constraint violation error.
    pub fn constraint(entity: &'static str, key: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            entity,
            key: key.into(),
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}
