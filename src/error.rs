//! Error handling for bulletin processing operations.
//!
//! Provides error types with context for input loading, configuration
//! validation, table reconciliation and output failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulletinError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Required input not found: {path}")]
    MissingInput { path: PathBuf },

    #[error("Invalid table in file: {path} - {reason}")]
    InvalidTable { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Column '{column}' from source '{source_name}' already exists in the merged table")]
    ColumnConflict { column: String, source_name: String },

    #[error("Invalid run date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl BulletinError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_table(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BulletinError>;
