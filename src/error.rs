//! Error handling for the shot dashboard
//!
//! This module defines the crate-wide error type and a Result alias.
//!
//! The variants mirror how failures propagate through the ingestion
//! pipeline: extraction failures are isolated per file (logged and
//! skipped), integrity failures abort the current operation and are
//! surfaced to the caller, and schedule failures mean a batch could not
//! be handed to the UI thread and must be reported rather than dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for shot dashboard operations
#[derive(Error, Debug)]
pub enum ShotDashError {
    /// A shot file could not be read or parsed; the file is skipped
    #[error("extraction failed for {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// A core table invariant was violated (e.g. duplicate row key)
    #[error("table integrity error: {0}")]
    Integrity(String),

    /// A row lookup matched no rows
    #[error("no row found for {0}")]
    Lookup(PathBuf),

    /// A merge task could not be dispatched to the UI thread
    #[error("UI dispatch failed: {0}")]
    Schedule(String),

    /// Errors related to configuration loading/saving
    #[error("configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShotDashError {
    /// Create an extraction error for a file.
    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ShotDashError::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for shot dashboard operations
pub type Result<T> = std::result::Result<T, ShotDashError>;
