use serde::{Deserialize, Serialize};

use crate::types::{DeviceFamily, Operation, Platform, WatchShape};

/// What a user request asks for, as decided by the intent step.
///
/// Built once per request and consumed immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentDecision {
    pub operation: Operation,

    /// Primary platform
    pub platform: Platform,

    /// All requested platforms, primary first; empty for single-platform requests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,

    /// Only set for iOS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_family: Option<DeviceFamily>,

    /// Only set for watchOS
    #[serde(
        default,
        rename = "watch_project_shape",
        skip_serializing_if = "Option::is_none"
    )]
    pub watch_shape: Option<WatchShape>,

    /// Always within [0, 1]
    pub confidence: f64,

    #[serde(default)]
    pub reason: String,
}

impl Default for IntentDecision {
    fn default() -> Self {
        Self {
            operation: Operation::Build,
            platform: Platform::Ios,
            platforms: Vec::new(),
            device_family: None,
            watch_shape: None,
            confidence: 0.0,
            reason: String::new(),
        }
    }
}

impl IntentDecision {
    /// Default decision that prefers `platform` (e.g. the project's last known platform)
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    /// Every platform this decision covers, primary first
    pub fn platform_set(&self) -> Vec<Platform> {
        if self.platforms.is_empty() {
            vec![self.platform]
        } else {
            self.platforms.clone()
        }
    }

    pub fn is_multi_platform(&self) -> bool {
        self.platforms.len() > 1
    }
}
