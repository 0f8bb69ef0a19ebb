// Library interface for marathon-log modules
// This allows integration tests to access the core functionality

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod storage;
pub mod store;
pub mod validation;
pub mod views;

// Re-export commonly used types for convenience
pub use models::*;
pub use config::AppConfig;
pub use error::{MarathonLogError, Result, StorageError, ValidationError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use storage::{MemoryStore, Persistence, SlotStore, SqliteStore};
pub use store::{reduce, Action, AppState, Store};
pub use validation::{GoalDraft, ProfileUpdate, RunDraft};
