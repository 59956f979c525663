// SPDX-License-Identifier: MIT

//! Typed error handling for suna-workflows

use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum SunaError {
    /// Non-success response from the backend API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Requested resource does not exist
    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Step tree errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Malformed backend URL
    #[error(transparent)]
    Url(#[from] url::ParseError),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Step tree and editor errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Steps payload is not an array of step objects
    #[error("Invalid steps payload: {0}")]
    InvalidSteps(String),

    /// Editor is loading or saving
    #[error("Editor is busy ({0})")]
    Busy(String),

    /// No step with this id in the tree
    #[error("Step not found: {0}")]
    StepNotFound(String),

    /// Workflow name is empty
    #[error("Workflow name is required")]
    MissingName,

    /// Step file with an extension we cannot read
    #[error("Unsupported step file format: {0}")]
    UnsupportedFormat(String),
}

impl SunaError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for SunaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for SunaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
