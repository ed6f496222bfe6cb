//! Core closed enums shared by every pipeline phase
//!
//! Each enum exposes a canonical `as_str` form (used on the wire and in
//! warnings) and a tolerant `from_hint` parser that accepts the spellings
//! a generative planner tends to produce. `from_hint` never panics; it
//! returns `None` for anything outside the closed set so callers can fall
//! back to a documented default.

use serde::{Deserialize, Serialize};

/// Lowercase and strip separators so "Apple Watch", "apple_watch" and
/// "apple-watch" all compare equal.
pub(crate) fn fold_hint(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Target platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Watchos,
    Tvos,
    Visionos,
    Macos,
}

impl Platform {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Watchos => "watchos",
            Platform::Tvos => "tvos",
            Platform::Visionos => "visionos",
            Platform::Macos => "macos",
        }
    }

    /// Name as it appears in project descriptors
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Watchos => "watchOS",
            Platform::Tvos => "tvOS",
            Platform::Visionos => "visionOS",
            Platform::Macos => "macOS",
        }
    }

    /// Parse from a loosely formatted hint (case-insensitive, aliases allowed)
    pub fn from_hint(value: &str) -> Option<Self> {
        match fold_hint(value).as_str() {
            "ios" | "iphone" | "ipad" | "iphoneos" | "ipados" => Some(Self::Ios),
            "watchos" | "watch" | "applewatch" => Some(Self::Watchos),
            "tvos" | "appletv" | "tv" => Some(Self::Tvos),
            "visionos" | "vision" | "visionpro" | "applevisionpro" | "xros" => {
                Some(Self::Visionos)
            }
            "macos" | "mac" | "osx" | "macosx" => Some(Self::Macos),
            _ => None,
        }
    }

    /// Value of `TARGETED_DEVICE_FAMILY` for platforms without a device family choice
    pub fn device_family_setting(&self) -> &'static str {
        match self {
            Platform::Ios => "1",
            Platform::Watchos => "4",
            Platform::Tvos => "3",
            Platform::Visionos => "7",
            Platform::Macos => "",
        }
    }

    /// Suffix appended to the app name to form this platform's source
    /// directory and top-level target name.
    ///
    /// watchOS and tvOS always carry their suffix. visionOS and macOS only
    /// need one when they share a project with another platform.
    pub fn source_suffix(&self, multi_platform: bool) -> &'static str {
        match self {
            Platform::Ios => "",
            Platform::Watchos => "Watch",
            Platform::Tvos => "TV",
            Platform::Visionos if multi_platform => "Vision",
            Platform::Macos if multi_platform => "Mac",
            Platform::Visionos | Platform::Macos => "",
        }
    }

    /// All platforms in canonical order
    pub fn all() -> [Self; 5] {
        [
            Self::Ios,
            Self::Watchos,
            Self::Tvos,
            Self::Visionos,
            Self::Macos,
        ]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Requested operation for a user request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Build,
    Edit,
    Fix,
    Ask,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Build => "build",
            Operation::Edit => "edit",
            Operation::Fix => "fix",
            Operation::Ask => "ask",
        }
    }

    pub fn from_hint(value: &str) -> Option<Self> {
        match fold_hint(value).as_str() {
            "build" | "create" | "new" => Some(Self::Build),
            "edit" | "modify" | "update" => Some(Self::Edit),
            "fix" | "repair" | "debug" => Some(Self::Fix),
            "ask" | "question" | "chat" => Some(Self::Ask),
            _ => None,
        }
    }
}

/// Device family for iOS targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    /// iPhone only
    Iphone,
    /// iPad only
    Ipad,
    /// iPhone and iPad
    Universal,
}

impl DeviceFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceFamily::Iphone => "iphone",
            DeviceFamily::Ipad => "ipad",
            DeviceFamily::Universal => "universal",
        }
    }

    pub fn from_hint(value: &str) -> Option<Self> {
        match fold_hint(value).as_str() {
            "iphone" | "phone" | "iphoneonly" | "phoneonly" => Some(Self::Iphone),
            "ipad" | "tablet" | "ipadonly" | "tabletonly" => Some(Self::Ipad),
            "universal" | "both" | "all" | "iphoneandipad" => Some(Self::Universal),
            _ => None,
        }
    }
}

/// Shape of a watchOS project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchShape {
    /// Self-contained watch app with no iOS host
    #[serde(rename = "watch_only")]
    Standalone,
    /// Watch app shipped inside an iOS host app
    #[serde(rename = "paired_ios")]
    Paired,
}

impl WatchShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchShape::Standalone => "watch_only",
            WatchShape::Paired => "paired_ios",
        }
    }

    pub fn from_hint(value: &str) -> Option<Self> {
        match fold_hint(value).as_str() {
            "watchonly" | "standalone" | "independent" => Some(Self::Standalone),
            "pairedios" | "paired" | "companion" | "withios" | "ioscompanion" => {
                Some(Self::Paired)
            }
            _ => None,
        }
    }

    /// Accepted literals, for error messages
    pub fn allowed() -> Vec<String> {
        vec![
            Self::Standalone.as_str().to_string(),
            Self::Paired.as_str().to_string(),
        ]
    }
}

/// Kinds of embedded extension targets a plan can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionKind {
    Widget,
    LiveActivity,
    Share,
    NotificationService,
    Safari,
    AppClip,
}

impl ExtensionKind {
    /// Canonical snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Widget => "widget",
            ExtensionKind::LiveActivity => "live_activity",
            ExtensionKind::Share => "share",
            ExtensionKind::NotificationService => "notification_service",
            ExtensionKind::Safari => "safari",
            ExtensionKind::AppClip => "app_clip",
        }
    }

    pub fn from_hint(value: &str) -> Option<Self> {
        match fold_hint(value).as_str() {
            "widget" | "widgets" | "widgetkit" => Some(Self::Widget),
            "liveactivity" | "liveactivities" => Some(Self::LiveActivity),
            "share" | "shareextension" => Some(Self::Share),
            "notificationservice" | "notificationserviceextension" => {
                Some(Self::NotificationService)
            }
            "safari" | "safariextension" | "safariwebextension" | "browserextension" => {
                Some(Self::Safari)
            }
            "appclip" | "clip" => Some(Self::AppClip),
            _ => None,
        }
    }

    /// Suffix appended to the app name when the plan does not name the target
    pub fn target_suffix(&self) -> &'static str {
        match self {
            ExtensionKind::Widget => "Widget",
            ExtensionKind::LiveActivity => "LiveActivity",
            ExtensionKind::Share => "ShareExtension",
            ExtensionKind::NotificationService => "NotificationService",
            ExtensionKind::Safari => "SafariExtension",
            ExtensionKind::AppClip => "Clip",
        }
    }

    /// Whether the kind reads data written by its host app
    pub fn needs_app_group(&self) -> bool {
        matches!(
            self,
            ExtensionKind::Widget | ExtensionKind::LiveActivity | ExtensionKind::Share
        )
    }

    pub fn all() -> [Self; 6] {
        [
            Self::Widget,
            Self::LiveActivity,
            Self::Share,
            Self::NotificationService,
            Self::Safari,
            Self::AppClip,
        ]
    }
}

impl std::fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
