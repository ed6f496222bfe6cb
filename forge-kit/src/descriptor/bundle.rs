//! Bundle identifier derivation.
//!
//! Every identifier is `<prefix>.<app>[.<suffix>...]` where each segment is
//! lowercase alphanumeric. No function here can produce an empty segment or
//! a trailing dot.

use crate::types::Platform;

pub const WATCH_APP_SUFFIX: &str = "watchkitapp";
pub const WATCH_EXTENSION_SUFFIX: &str = "watchkitextension";

/// Lowercase ASCII alphanumerics of `value`
pub fn sanitize_token(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// First non-empty sanitized candidate, or `fallback`
pub fn token_or(candidates: &[&str], fallback: &str) -> String {
    candidates
        .iter()
        .map(|candidate| sanitize_token(candidate))
        .find(|token| !token.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Append a segment; blank segments are ignored
pub fn child(parent: &str, segment: &str) -> String {
    let token = sanitize_token(segment);
    if token.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}.{token}")
    }
}

/// Bundle identifier of the app's primary target
pub fn app_bundle_id(prefix: &str, app_name: &str) -> String {
    let prefix = prefix.trim_matches('.');
    child(prefix, &token_or(&[app_name], "app"))
}

/// Segment distinguishing a secondary top-level app in a multi-platform project
pub fn platform_token(platform: Platform) -> &'static str {
    match platform {
        Platform::Ios => "ios",
        Platform::Watchos => "watch",
        Platform::Tvos => "tv",
        Platform::Visionos => "vision",
        Platform::Macos => "mac",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_lowercases_name() {
        assert_eq!(app_bundle_id("com.appforge", "HabitTracker"), "com.appforge.habittracker");
        assert_eq!(app_bundle_id("com.appforge.", "Fit"), "com.appforge.fit");
    }

    #[test]
    fn blank_segments_never_produce_empty_parts() {
        assert_eq!(child("com.a.b", ""), "com.a.b");
        assert_eq!(child("com.a.b", "--"), "com.a.b");
        assert_eq!(token_or(&["", "My Widget!"], "extension"), "mywidget");
        assert_eq!(token_or(&["", " "], "extension"), "extension");
    }
}
