use chrono::NaiveDate;
use sea_orm::error::DbErr;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("CSV error: {0}")]
    Csv(
        #[from]
        #[serde(skip)]
        csv::Error,
    ),

    #[error("IO error: {0}")]
    Io(
        #[from]
        #[serde(skip)]
        std::io::Error,
    ),

    #[error("Corrupt sale row {id}: {reason}")]
    CorruptRow { id: i32, reason: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Errors the caller can fix by changing its input (bad filters, bad arguments).
    /// Everything else is fatal for the current operation.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDateRange { .. } | Self::InvalidInput(_)
        )
    }

    /// Message suitable for an end user. Internal failures are reported generically.
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InvalidDateRange { .. } => {
                "Start date cannot be later than end date".to_string()
            }
            Self::CorruptRow { .. } | Self::InternalError(_) => {
                "Internal error".to_string()
            }
            _ => self.to_string(),
        }
    }
}
