//! Error types for the diary application.
//!
//! Most failures in the journal are deliberately swallowed at the storage,
//! session and theme boundaries and routed to a diagnostic sink instead. The
//! variants below are what those boundaries report, and what the command line
//! surfaces when an operation genuinely cannot proceed.

use std::io;

use thiserror::Error;

/// The main error type for the diary application.
#[derive(Error, Debug)]
pub enum DiaryError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A key-value storage backend could not read or write a key.
    #[error("Storage error for key {key}: {message}")]
    StorageError { key: String, message: String },

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// The identity provider rejected a sign-in or sign-out request.
    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    /// A persisted or requested theme value is not `light` or `dark`.
    #[error("Invalid theme: {value}")]
    InvalidTheme { value: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("{message}")]
    EditorError { message: String },
}
