/// Configuration module for appforge
///
/// Implements layered configuration:
/// 1. Defaults (from code)
/// 2. Config file (appforge.toml)
/// 3. Environment variables (APPFORGE_* prefix)
///
/// # Example
///
/// ```no_run
/// use appforge_kit::config::ConfigLoader;
///
/// // Load from default locations
/// let config = ConfigLoader::load_default()?;
///
/// // Or load from a specific file
/// let config = ConfigLoader::new().with_file("./appforge.toml").load()?;
/// # Ok::<(), appforge_kit::config::ConfigError>(())
/// ```
pub mod error;
pub mod loader;

// Re-export main types
pub use error::{ConfigError, Result};
pub use loader::{CompletionConfig, ConfigLoader, DeploymentTargets, ForgeConfig, ProjectConfig};
