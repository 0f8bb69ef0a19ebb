//! Unified error hierarchy for marathon-log
//!
//! Validation errors go back to the command that produced the input.
//! Storage errors are logged by the persistence layer and never reach the
//! store. Whatever reaches the binary is shown through `user_message()`.

use thiserror::Error;

/// Top-level error type for all marathon-log operations
#[derive(Debug, Error)]
pub enum MarathonLogError {
    /// User input rejected before dispatch
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Slot store read/write errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON payload encode/decode errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file, data directory or log sink could not be set up
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Input validation errors, one per rule the entry forms enforce
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required form field was left empty
    #[error("Please fill in all required fields: {fields}.")]
    MissingFields { fields: String },

    /// Distance must be strictly positive
    #[error("Distance must be greater than 0.")]
    NonPositiveDistance,

    /// Numeric field could not be parsed
    #[error("Invalid number for {field}: '{value}'")]
    InvalidNumber { field: String, value: String },

    /// Duration text does not match MM:SS or HH:MM:SS
    #[error("Duration must be in MM:SS or HH:MM:SS format.")]
    InvalidDuration { value: String },

    /// Rating outside 1..=5
    #[error("{field} must be between 1 and 5, got {value}")]
    RatingOutOfRange { field: String, value: u8 },

    /// Goal deadline earlier than its start date
    #[error("Deadline must not be before the start date.")]
    DeadlineBeforeStart,

    /// Goal progress outside 0..=100
    #[error("Progress must be between 0 and 100, got {value}")]
    ProgressOutOfRange { value: f64 },

    /// Email address is not well formed
    #[error("Invalid email address: {value}")]
    InvalidEmail { value: String },

    /// Date text could not be parsed
    #[error("Invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { value: String },
}

/// Slot store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Writing would exceed the store capacity
    #[error("Storage quota exceeded writing {key}: {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// Slot payload could not be encoded or decoded
    #[error("Slot {key} is unreadable: {reason}")]
    CorruptSlot { key: String, reason: String },
}

/// Result type alias for marathon-log operations
pub type Result<T> = std::result::Result<T, MarathonLogError>;

impl MarathonLogError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MarathonLogError::Validation(_) => ErrorSeverity::Warning,
            MarathonLogError::Storage(StorageError::CorruptSlot { .. }) => ErrorSeverity::Warning,
            MarathonLogError::Storage(_)
            | MarathonLogError::Serialization(_)
            | MarathonLogError::Configuration(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            MarathonLogError::Validation(err) => err.to_string(),
            MarathonLogError::Storage(StorageError::QuotaExceeded { .. }) => {
                "Local storage is full. Your latest change was kept in memory only.".to_string()
            }
            MarathonLogError::Storage(StorageError::CorruptSlot { key, .. }) => {
                format!("Saved data in '{}' could not be read and was skipped.", key)
            }
            MarathonLogError::Configuration(reason) => {
                format!("Configuration problem: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The command did not complete
    Error,
    /// Rejected input or skipped data; nothing was lost
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
