/*!
 * Error types for the lingosplice application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors that can occur while translating a batch of texts
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The response did not carry a payload of the expected shape.
    /// Counted against the chunk's attempt budget.
    #[error("Invalid translation payload: {0}")]
    Validation(String),

    /// A chunk exhausted its attempts, or hit an error that is never retried;
    /// fatal for the whole run
    #[error("Translation of batch {key} failed after {attempts} attempt(s){}: {message}", retry_note(.retryable))]
    Failure {
        /// Range key of the chunk that failed
        key: String,
        /// Number of attempts made
        attempts: u32,
        /// Whether the last error would have been retried with attempts left
        retryable: bool,
        /// Message of the last error seen
        message: String,
    },

    /// Checkpoint store could not be read or written
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CacheError),
}

/// Errors raised by the persisted cache files
#[derive(Error, Debug)]
pub enum CacheError {
    /// The persisted file exists but cannot be parsed
    #[error("Cache file {path:?} is corrupt: {message}")]
    Corrupt {
        /// Path of the corrupt file
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Reading or writing a cache file failed
    #[error("Cache I/O error on {path:?}: {message}")]
    Io {
        /// Path of the file
        path: PathBuf,
        /// I/O message
        message: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// A required option is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from the persisted cache
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// A text was looked up in the pool without ever being added
    #[error("Text not present in the pool: {0:?}")]
    Lookup(String),

    /// A replacement mark does not fit its source unit
    #[error("Invalid replacement mark in {path}: {message}")]
    InvalidMark {
        /// Source unit path
        path: String,
        /// What is wrong with the mark
        message: String,
    },

    /// A source unit could not be scanned for literals
    #[error("Failed to scan {path}: {message}")]
    Parse {
        /// Source unit path
        path: String,
        /// Scanner message
        message: String,
    },

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

fn retry_note(retryable: &bool) -> &'static str {
    if *retryable {
        ""
    } else {
        " (error is not retryable)"
    }
}

impl TranslationError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(ProviderError::AuthenticationError(_)) => false,
            Self::Provider(ProviderError::ApiError { status_code, .. }) => {
                *status_code == 429 || *status_code >= 500
            }
            Self::Provider(_) | Self::Validation(_) => true,
            Self::Failure { .. } | Self::Checkpoint(_) => false,
        }
    }
}
