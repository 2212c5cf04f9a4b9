// src/error.rs

//! Unified error handling for the ingestion pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A configured pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or unusable input file
    #[error("Input error: {0}")]
    Input(String),

    /// PDF text extraction failed
    #[error("Extraction error for {path}: {message}")]
    Extraction { path: String, message: String },

    /// Backend rejected a request
    #[error("Backend error on '{table}' (status {status}): {message}")]
    Backend {
        table: String,
        status: u16,
        message: String,
    },
}

impl AppError {
    /// Create a pattern compilation error.
    pub fn pattern(pattern: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Create an extraction error with the offending path.
    pub fn extraction(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a backend error for a table.
    pub fn backend(table: impl Into<String>, status: u16, message: impl fmt::Display) -> Self {
        Self::Backend {
            table: table.into(),
            status,
            message: message.to_string(),
        }
    }

    /// Whether the error belongs to the input class (missing or unusable PDF).
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Extraction { .. })
    }
}
