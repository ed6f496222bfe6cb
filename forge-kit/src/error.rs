//! Error types for appforge operations
//!
//! Every failure the core can surface lives in [`ForgeError`]. Tolerated
//! anomalies (unknown enum values, out-of-range confidence, unsupported
//! capability keys) are never errors; they are corrected in place and
//! reported as warnings.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Appforge result type alias
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Error category, used for exit codes and structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Intent or plan text is not syntactically valid
    MalformedInput,
    /// Well-formed input that violates a domain rule
    SemanticValidation,
    /// Planned files still missing or invalid after the pass budget
    Completion,
    /// Filesystem, serialization, configuration or collaborator failures
    Infrastructure,
}

impl ErrorClass {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedInput => "MALFORMED_INPUT",
            Self::SemanticValidation => "SEMANTIC_VALIDATION",
            Self::Completion => "COMPLETION",
            Self::Infrastructure => "INFRASTRUCTURE",
        }
    }

    /// Process exit code used by the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MalformedInput | Self::SemanticValidation | Self::Completion => 2,
            Self::Infrastructure => 3,
        }
    }
}

/// Appforge error taxonomy
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Malformed intent payload: {reason}")]
    MalformedIntent { reason: String },

    #[error("Malformed build plan: {reason}")]
    MalformedPlan { reason: String },

    #[error(
        "Extension kind(s) not supported on {platform}: {}. Supported on {platform}: {}",
        .kinds.join(", "),
        supported_hint(.supported)
    )]
    UnsupportedExtensions {
        platform: String,
        kinds: Vec<String>,
        supported: Vec<String>,
    },

    #[error("Invalid watch project shape '{value}' (allowed: {})", .allowed.join(", "))]
    InvalidWatchShape { value: String, allowed: Vec<String> },

    #[error("Invalid app name '{0}': must contain at least one ASCII letter or digit")]
    InvalidAppName(String),

    #[error("Project descriptor graph is invalid: {0}")]
    DescriptorGraph(String),

    #[error("Generation incomplete after {passes} pass(es):\n{summary}")]
    Incomplete { passes: u32, summary: String },

    #[error("Materializer failed: {0}")]
    Materializer(String),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize JSON: {source}")]
    JsonSerialize { source: serde_json::Error },

    #[error("Failed to serialize YAML: {source}")]
    YamlSerialize { source: serde_yaml::Error },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn supported_hint(supported: &[String]) -> String {
    if supported.is_empty() {
        "none".to_string()
    } else {
        supported.join(", ")
    }
}

impl ForgeError {
    /// Category of this error
    pub fn class(&self) -> ErrorClass {
        match self {
            ForgeError::MalformedIntent { .. } | ForgeError::MalformedPlan { .. } => {
                ErrorClass::MalformedInput
            }
            ForgeError::UnsupportedExtensions { .. }
            | ForgeError::InvalidWatchShape { .. }
            | ForgeError::InvalidAppName(_) => ErrorClass::SemanticValidation,
            ForgeError::Incomplete { .. } => ErrorClass::Completion,
            ForgeError::DescriptorGraph(_)
            | ForgeError::Materializer(_)
            | ForgeError::FileRead { .. }
            | ForgeError::FileWrite { .. }
            | ForgeError::DirectoryCreate { .. }
            | ForgeError::JsonSerialize { .. }
            | ForgeError::YamlSerialize { .. }
            | ForgeError::Config(_) => ErrorClass::Infrastructure,
        }
    }
}
