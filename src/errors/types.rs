//! Error type definitions for the InstaScheduler application
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that makes debugging and error
//! handling more straightforward.

use thiserror::Error;

/// Top-level application error type
///
/// This enum represents all possible errors that can occur in the application.
/// It uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining.
#[derive(Error, Debug)]
pub enum AppError {
    /// Schedule-request validation failures (bad path, unparsable time)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Scheduler registration errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Graph API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Settings / schedule snapshot persistence errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Media hosting errors (no public URL available for a local file)
    #[error("Media host error: {message}")]
    MediaHost { message: String },
}

/// Scheduler specific errors
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A job with the same caller-supplied id is already registered
    #[error("Duplicate job id: {job_id}")]
    DuplicateJob { job_id: String },
}

/// Graph API client specific errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response from the API
    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response decoded but a required field was absent
    #[error("Missing field '{field}' in API response")]
    MissingField { field: String },

    /// Connectivity, timeout, or body-decoding failures
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Persistence layer specific errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// File I/O failures during an atomic write
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Data serialization failures
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a media host error
    pub fn media_host<S: Into<String>>(message: S) -> Self {
        Self::MediaHost {
            message: message.into(),
        }
    }
}

impl ApiError {
    /// Create an HTTP status error
    pub fn http<E: Into<String>, B: Into<String>>(endpoint: E, status: u16, body: B) -> Self {
        Self::Http {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field<F: Into<String>>(field: F) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}
