//! Errors from loading `appforge.toml` and capability matrix files.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layered sources could not be merged or deserialized
    #[error("Failed to load appforge configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// `ForgeConfig::default()` could not be encoded as the base layer
    #[error("Failed to encode default configuration: {0}")]
    DefaultsEncoding(String),

    #[error("Invalid capability matrix: {0}")]
    CapabilityMatrix(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::DefaultsEncoding(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::CapabilityMatrix(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_matrix_toml_is_a_matrix_error() {
        let err: ConfigError = toml::from_str::<toml::Table>("[watchos\n")
            .map(|_| ())
            .map_err(ConfigError::from)
            .expect_err("unterminated table header");
        assert!(matches!(err, ConfigError::CapabilityMatrix(_)));
        assert!(err.to_string().starts_with("Invalid capability matrix"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ConfigError::FileNotFound(PathBuf::from("/etc/appforge.toml"));
        assert_eq!(err.to_string(), "Configuration file not found: /etc/appforge.toml");
    }
}
