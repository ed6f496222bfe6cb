//! Capability filtering and extension validation.
//!
//! Filtering is lenient: unsupported rule keys are dropped with a warning
//! and generation continues. Extension validation is strict, because a
//! dropped extension would change the set of targets in the project.

use serde::Serialize;

use super::matrix::CapabilityMatrix;
use crate::error::{ForgeError, Result};
use crate::types::{ExtensionKind, Platform};

/// Result of filtering a rule-key list against one platform.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    /// Keys that survived, in input order
    pub keys: Vec<String>,
    /// Removal and advisory warnings, in input order
    pub warnings: Vec<String>,
    /// Keys that were dropped
    pub removed: Vec<String>,
}

impl CapabilityMatrix {
    /// Filter requested rule keys for `platform`.
    ///
    /// Blank keys are skipped silently. A key appearing more than once is
    /// evaluated each time, so a dropped duplicate produces one warning
    /// per occurrence. iOS is never filtered, whatever the matrix says.
    pub fn filter_capabilities<S: AsRef<str>>(
        &self,
        platform: Platform,
        keys: &[S],
    ) -> FilterOutcome {
        let record = self.for_platform(platform);
        let mut outcome = FilterOutcome::default();

        for key in keys {
            let key = key.as_ref().trim();
            if key.is_empty() {
                continue;
            }
            if platform == Platform::Ios {
                outcome.keys.push(key.to_string());
                continue;
            }

            if record.is_unsupported(key) {
                let warning = format!(
                    "Removed '{key}': not supported on {}",
                    platform.display_name()
                );
                tracing::warn!(platform = platform.as_str(), key, "{warning}");
                outcome.warnings.push(warning);
                outcome.removed.push(key.to_string());
                continue;
            }

            if let Some(caveat) = record.caveat(key) {
                let warning = format!(
                    "'{key}' behaves differently on {}: {caveat}",
                    platform.display_name()
                );
                tracing::warn!(platform = platform.as_str(), key, "{warning}");
                outcome.warnings.push(warning);
            }

            outcome.keys.push(key.to_string());
        }

        outcome
    }

    /// Fail if any requested extension kind cannot be embedded on `platform`.
    ///
    /// Kinds are given as raw strings from the plan. An empty kind is
    /// tolerated here (the compiler derives a fallback identifier for it);
    /// an unrecognized non-empty kind is reported like an unsupported one.
    pub fn validate_extensions<S: AsRef<str>>(&self, platform: Platform, kinds: &[S]) -> Result<()> {
        let record = self.for_platform(platform);
        let mut offending: Vec<String> = Vec::new();

        for raw in kinds {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            let rejected = match ExtensionKind::from_hint(raw) {
                Some(kind) => !record.supports_extension(kind),
                None => true,
            };
            if rejected && !offending.iter().any(|k| k == raw) {
                offending.push(raw.to_string());
            }
        }

        if offending.is_empty() {
            return Ok(());
        }

        Err(ForgeError::UnsupportedExtensions {
            platform: platform.display_name().to_string(),
            kinds: offending,
            supported: record
                .supported_extensions()
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ios_is_identity() {
        let matrix = CapabilityMatrix::builtin();
        let keys = ["camera", "arkit", "nfc"];
        let outcome = matrix.filter_capabilities(Platform::Ios, &keys);
        assert_eq!(outcome.keys, vec!["camera", "arkit", "nfc"]);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn ios_record_from_toml_is_ignored_by_filter() {
        let matrix = CapabilityMatrix::from_toml_str(
            r#"
[ios]
unsupported_keys = ["camera"]
[ios.conditional_keys]
nfc = "only on newer devices"
"#,
        )
        .expect("matrix parses");
        let outcome = matrix.filter_capabilities(Platform::Ios, &["Camera", "nfc"]);
        assert_eq!(outcome.keys, vec!["Camera", "nfc"]);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn watchos_drops_unsupported_and_flags_conditional() {
        let matrix = CapabilityMatrix::builtin();
        let keys = ["healthkit", "camera", "haptics", "storage"];
        let outcome = matrix.filter_capabilities(Platform::Watchos, &keys);

        assert_eq!(outcome.keys, vec!["healthkit", "haptics", "storage"]);
        assert_eq!(outcome.removed, vec!["camera"]);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings[0].starts_with("Removed 'camera'"));
        assert!(outcome.warnings[1].contains("WKInterfaceDevice"));
    }

    #[test]
    fn tvos_filter_is_case_insensitive() {
        let matrix = CapabilityMatrix::builtin();
        let keys = ["HealthKit", "Notifications"];
        let outcome = matrix.filter_capabilities(Platform::Tvos, &keys);
        assert_eq!(outcome.keys, vec!["Notifications"]);
        assert_eq!(outcome.removed, vec!["HealthKit"]);
    }

    #[test]
    fn tvos_rejects_every_extension() {
        let matrix = CapabilityMatrix::builtin();
        let err = matrix
            .validate_extensions(Platform::Tvos, &["widget", "share"])
            .expect_err("tvOS embeds no extensions");
        match err {
            ForgeError::UnsupportedExtensions {
                kinds, supported, ..
            } => {
                assert_eq!(kinds, vec!["widget", "share"]);
                assert!(supported.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn watchos_accepts_widget_rejects_share() {
        let matrix = CapabilityMatrix::builtin();
        assert!(matrix.validate_extensions(Platform::Watchos, &["widget"]).is_ok());

        let err = matrix
            .validate_extensions(Platform::Watchos, &["widget", "share", "share"])
            .expect_err("share is not available on watchOS");
        let msg = err.to_string();
        assert!(msg.contains("share"), "{msg}");
        assert!(msg.contains("widget, notification_service"), "{msg}");
    }

    #[test]
    fn empty_kind_is_tolerated_unknown_kind_is_not() {
        let matrix = CapabilityMatrix::builtin();
        assert!(matrix.validate_extensions(Platform::Ios, &["", "widget"]).is_ok());
        assert!(matrix.validate_extensions(Platform::Ios, &["hologram"]).is_err());
    }
}
