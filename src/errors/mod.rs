pub mod types;

pub use types::{ApiError, AppError, PersistenceError, SchedulerError};

/// Convenience alias used throughout the application.
pub type AppResult<T> = Result<T, AppError>;
