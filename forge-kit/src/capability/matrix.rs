//! Per-platform capability records and the built-in matrix.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::ConfigError;
use crate::error::{ForgeError, Result};
use crate::types::{ExtensionKind, Platform};

/// What one platform cannot do, or does differently.
///
/// Keys are stored lowercased; lookups fold case and surrounding
/// whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Rule keys removed from plans targeting this platform
    #[serde(default)]
    pub unsupported_keys: BTreeSet<String>,

    /// Rule keys kept, but with a behavioral caveat
    #[serde(default)]
    pub conditional_keys: BTreeMap<String, String>,

    /// Extension kinds this platform cannot embed
    #[serde(default)]
    pub unsupported_extensions: BTreeSet<ExtensionKind>,
}

impl PlatformCapabilities {
    pub fn is_unsupported(&self, key: &str) -> bool {
        self.unsupported_keys.contains(&normalize_key(key))
    }

    pub fn caveat(&self, key: &str) -> Option<&str> {
        self.conditional_keys
            .get(&normalize_key(key))
            .map(String::as_str)
    }

    pub fn supports_extension(&self, kind: ExtensionKind) -> bool {
        !self.unsupported_extensions.contains(&kind)
    }

    /// Extension kinds this platform accepts, in canonical order
    pub fn supported_extensions(&self) -> Vec<ExtensionKind> {
        ExtensionKind::all()
            .into_iter()
            .filter(|kind| self.supports_extension(*kind))
            .collect()
    }

    fn normalized(self) -> Self {
        Self {
            unsupported_keys: self
                .unsupported_keys
                .iter()
                .map(|k| normalize_key(k))
                .collect(),
            conditional_keys: self
                .conditional_keys
                .into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
            unsupported_extensions: self.unsupported_extensions,
        }
    }
}

pub(crate) fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

/// Capability records for every platform.
///
/// A platform without a record supports everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMatrix {
    records: BTreeMap<Platform, PlatformCapabilities>,
}

static EMPTY_RECORD: PlatformCapabilities = PlatformCapabilities {
    unsupported_keys: BTreeSet::new(),
    conditional_keys: BTreeMap::new(),
    unsupported_extensions: BTreeSet::new(),
};

impl CapabilityMatrix {
    /// Matrix with explicit records
    pub fn new(records: BTreeMap<Platform, PlatformCapabilities>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|(platform, record)| (platform, record.normalized()))
                .collect(),
        }
    }

    /// Record for a platform (empty when the platform has no restrictions)
    pub fn for_platform(&self, platform: Platform) -> &PlatformCapabilities {
        self.records.get(&platform).unwrap_or(&EMPTY_RECORD)
    }

    /// Parse a matrix from TOML, one table per platform:
    ///
    /// ```toml
    /// [watchos]
    /// unsupported_keys = ["camera"]
    /// unsupported_extensions = ["share"]
    /// [watchos.conditional_keys]
    /// haptics = "Use WKInterfaceDevice haptics"
    /// ```
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        let records: BTreeMap<Platform, PlatformCapabilities> = toml::from_str(content)?;
        Ok(Self::new(records))
    }

    /// Load a matrix file, or fall back to [`CapabilityMatrix::builtin`] when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::builtin());
        };
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ForgeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let matrix = Self::from_toml_str(&content)?;
        tracing::info!("Loaded capability matrix from {}", path.display());
        Ok(matrix)
    }

    /// The built-in matrix
    pub fn builtin() -> Self {
        let mut records = BTreeMap::new();
        records.insert(Platform::Watchos, watchos_record());
        records.insert(Platform::Tvos, tvos_record());
        records.insert(
            Platform::Visionos,
            PlatformCapabilities {
                unsupported_extensions: [ExtensionKind::LiveActivity, ExtensionKind::AppClip]
                    .into_iter()
                    .collect(),
                ..Default::default()
            },
        );
        records.insert(
            Platform::Macos,
            PlatformCapabilities {
                unsupported_extensions: [ExtensionKind::LiveActivity, ExtensionKind::AppClip]
                    .into_iter()
                    .collect(),
                ..Default::default()
            },
        );
        Self::new(records)
    }
}

fn keys(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|k| (*k).to_string()).collect()
}

fn caveats(list: &[(&str, &str)]) -> BTreeMap<String, String> {
    list.iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn watchos_record() -> PlatformCapabilities {
    PlatformCapabilities {
        unsupported_keys: keys(&[
            "camera",
            "arkit",
            "nfc",
            "biometrics",
            "photos",
            "webkit",
            "live-activities",
            "app-clip",
            "share-extension",
            "safari-extension",
        ]),
        conditional_keys: caveats(&[
            (
                "haptics",
                "watchOS plays haptics through WKInterfaceDevice instead of UIKit feedback generators",
            ),
            (
                "maps",
                "MapKit on watchOS supports map display and annotations only",
            ),
            (
                "notifications",
                "rich notification UI on watchOS needs a dedicated notification scene",
            ),
            (
                "widgets",
                "widgets on watchOS render as complications in accessory families only",
            ),
            (
                "speech",
                "watchOS offers dictation input only; SFSpeechRecognizer is unavailable",
            ),
            (
                "location",
                "location updates on watchOS are power-constrained; prefer significant changes",
            ),
        ]),
        unsupported_extensions: [
            ExtensionKind::LiveActivity,
            ExtensionKind::Share,
            ExtensionKind::Safari,
            ExtensionKind::AppClip,
        ]
        .into_iter()
        .collect(),
    }
}

fn tvos_record() -> PlatformCapabilities {
    PlatformCapabilities {
        unsupported_keys: keys(&[
            "camera",
            "haptics",
            "healthkit",
            "arkit",
            "nfc",
            "biometrics",
            "photos",
            "webkit",
            "apple-pay",
            "live-activities",
            "widgets",
            "app-clip",
            "share-extension",
            "safari-extension",
        ]),
        conditional_keys: caveats(&[
            (
                "notifications",
                "tvOS supports badge updates only; alerts and banners are not shown",
            ),
            (
                "location",
                "tvOS provides coarse when-in-use location only",
            ),
            (
                "maps",
                "MapKit on tvOS is display-only and navigated with the focus engine",
            ),
            (
                "gestures",
                "tvOS input comes from the Siri Remote focus engine, not touch",
            ),
            (
                "text-input",
                "text entry on tvOS uses the fullscreen keyboard; keep forms short",
            ),
        ]),
        unsupported_extensions: ExtensionKind::all().into_iter().collect(),
    }
}
