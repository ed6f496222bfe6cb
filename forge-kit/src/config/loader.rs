use crate::config::error::{ConfigError, Result};
use crate::types::Platform;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Project naming and descriptor output
    #[serde(default)]
    pub project: ProjectConfig,

    /// Minimum OS versions per platform
    #[serde(default)]
    pub deployment: DeploymentTargets,

    /// Completion verification loop
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Project naming and descriptor output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Reverse-DNS prefix for every bundle identifier
    #[serde(default = "default_bundle_id_prefix")]
    pub bundle_id_prefix: String,

    /// File name of the descriptor written at the project root
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,

    /// Optional source root shared by every target of a multi-platform project
    #[serde(default = "default_shared_source_dir")]
    pub shared_source_dir: String,

    #[serde(default = "default_swift_version")]
    pub swift_version: String,

    #[serde(default = "default_marketing_version")]
    pub marketing_version: String,

    #[serde(default = "default_build_number")]
    pub build_number: String,

    /// TOML file replacing the built-in capability matrix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities_file: Option<PathBuf>,
}

/// Deployment targets per platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentTargets {
    #[serde(default = "default_ios")]
    pub ios: String,
    #[serde(default = "default_watchos")]
    pub watchos: String,
    #[serde(default = "default_tvos")]
    pub tvos: String,
    #[serde(default = "default_visionos")]
    pub visionos: String,
    #[serde(default = "default_macos")]
    pub macos: String,
}

impl DeploymentTargets {
    pub fn for_platform(&self, platform: Platform) -> &str {
        match platform {
            Platform::Ios => &self.ios,
            Platform::Watchos => &self.watchos,
            Platform::Tvos => &self.tvos,
            Platform::Visionos => &self.visionos,
            Platform::Macos => &self.macos,
        }
    }
}

/// Completion verification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Verification passes before generation is declared failed
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,
}

// Default value functions
fn default_bundle_id_prefix() -> String {
    "com.appforge".to_string()
}
fn default_descriptor_file() -> String {
    "project.yml".to_string()
}
fn default_shared_source_dir() -> String {
    "Shared".to_string()
}
fn default_swift_version() -> String {
    "5.9".to_string()
}
fn default_marketing_version() -> String {
    "1.0".to_string()
}
fn default_build_number() -> String {
    "1".to_string()
}
fn default_ios() -> String {
    "17.0".to_string()
}
fn default_watchos() -> String {
    "10.0".to_string()
}
fn default_tvos() -> String {
    "17.0".to_string()
}
fn default_visionos() -> String {
    "1.0".to_string()
}
fn default_macos() -> String {
    "14.0".to_string()
}
fn default_max_passes() -> u32 {
    3
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            bundle_id_prefix: default_bundle_id_prefix(),
            descriptor_file: default_descriptor_file(),
            shared_source_dir: default_shared_source_dir(),
            swift_version: default_swift_version(),
            marketing_version: default_marketing_version(),
            build_number: default_build_number(),
            capabilities_file: None,
        }
    }
}

impl Default for DeploymentTargets {
    fn default() -> Self {
        Self {
            ios: default_ios(),
            watchos: default_watchos(),
            tvos: default_tvos(),
            visionos: default_visionos(),
            macos: default_macos(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
        }
    }
}

impl ForgeConfig {
    /// Reject values the compiler or verifier cannot work with
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.project.bundle_id_prefix;
        let segments_ok = !prefix.is_empty()
            && prefix.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
        if !segments_ok {
            return Err(ConfigError::ValidationError(format!(
                "project.bundle_id_prefix '{prefix}' must be dot-separated non-empty segments of [A-Za-z0-9-]"
            )));
        }

        if self.project.descriptor_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "project.descriptor_file must not be empty".to_string(),
            ));
        }

        if self.completion.max_passes == 0 {
            return Err(ConfigError::ValidationError(
                "completion.max_passes must be at least 1".to_string(),
            ));
        }

        for platform in Platform::all() {
            if self.deployment.for_platform(platform).trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "deployment.{} must not be empty",
                    platform.as_str()
                )));
            }
        }

        Ok(())
    }
}

/// Configuration loader with layered merging support
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new ConfigLoader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration with layered merging:
    /// 1. Start with defaults (from Default implementations)
    /// 2. Merge config file if provided
    /// 3. Override with environment variables (APPFORGE_ prefix)
    pub fn load(&self) -> Result<ForgeConfig> {
        let mut builder = Config::builder();

        // Layer 1: Defaults (serialize defaults to JSON and load as base)
        let defaults_json = serde_json::to_string(&ForgeConfig::default())?;
        builder = builder.add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        // Layer 2: Config file (if provided)
        if let Some(ref path) = self.config_path {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_ref()));
            } else {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
        }

        // Layer 3: Environment variables, double underscore for nesting
        // Example: APPFORGE_COMPLETION__MAX_PASSES=5
        builder = builder.add_source(
            Environment::with_prefix("APPFORGE")
                .prefix_separator("_")
                .separator("__"),
        );

        let forge_config: ForgeConfig = builder.build()?.try_deserialize()?;
        forge_config.validate()?;
        tracing::debug!(
            bundle_id_prefix = %forge_config.project.bundle_id_prefix,
            max_passes = forge_config.completion.max_passes,
            "configuration loaded"
        );

        Ok(forge_config)
    }

    /// Locate the default config file in standard locations:
    /// 1. Current directory: ./appforge.toml
    /// 2. XDG config: ~/.config/appforge/config.toml
    /// 3. Home directory: ~/.appforge.toml
    pub fn find_config_file() -> Option<PathBuf> {
        let cwd_config = PathBuf::from("./appforge.toml");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("appforge").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".appforge.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<ForgeConfig> {
        let loader = if let Some(config_path) = Self::find_config_file() {
            ConfigLoader::new().with_file(config_path)
        } else {
            ConfigLoader::new()
        };

        loader.load()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
