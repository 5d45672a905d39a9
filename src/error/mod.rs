//! Error types for cf-support

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cf-support
#[derive(Debug, Error)]
pub enum SupportError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Invalid runtime type: {0}")]
    InvalidRuntimeType(String),

    #[error("Codefresh credentials not found: {0}")]
    CredentialsNotFound(String),

    #[error("Failed to fetch {kind}: {message}")]
    FetchFailed { kind: String, message: String },

    #[error("Failed to process {kind}/{item}: {message}")]
    ItemProcessingFailed {
        kind: String,
        item: String,
        message: String,
    },

    #[error("Malformed Helm release data in secret '{secret}': {reason}")]
    MalformedReleaseData { secret: String, reason: String },

    #[error("Failed to archive {}: {reason}", staging.display())]
    ArchivalFailed { staging: PathBuf, reason: String },

    #[error("{0} is not an On-Prem instance")]
    NotOnPrem(String),

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("`{command}` failed: {stderr}")]
    Subprocess { command: String, stderr: String },

    #[error("Concurrency pool '{0}' is closed")]
    LimiterClosed(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SupportError {
    /// Wrap any error as a fetch failure for the given resource kind
    pub fn fetch_failed(kind: &str, err: impl std::fmt::Display) -> Self {
        SupportError::FetchFailed {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SupportError {
    fn from(e: serde_json::Error) -> Self {
        SupportError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for SupportError {
    fn from(e: serde_yaml::Error) -> Self {
        SupportError::Serialization(e.to_string())
    }
}

/// Result type alias for cf-support
pub type Result<T> = std::result::Result<T, SupportError>;
