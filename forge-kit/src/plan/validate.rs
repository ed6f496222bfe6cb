//! Pre-compilation plan validation.

use serde::Serialize;
use std::collections::BTreeMap;

use super::schema::BuildPlan;
use crate::capability::CapabilityMatrix;
use crate::error::{ForgeError, Result};
use crate::types::Platform;

/// Outcome of a successful validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// Sanitized app name used for targets and bundle identifiers
    pub app_name: String,
    /// Rule keys surviving the filter, per platform
    pub rule_keys: BTreeMap<Platform, Vec<String>>,
    /// Advisory warnings from capability filtering, in platform order
    pub warnings: Vec<String>,
}

/// Reduce a display name to a target-safe identifier.
///
/// Keeps ASCII letters and digits; a leading digit gets an `App` prefix.
pub fn sanitize_app_name(name: &str) -> Result<String> {
    let cleaned: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
    match cleaned.chars().next() {
        None => Err(ForgeError::InvalidAppName(name.to_string())),
        Some(first) if first.is_ascii_digit() => Ok(format!("App{cleaned}")),
        Some(_) => Ok(cleaned),
    }
}

/// Validate a plan before compiling it.
///
/// Extension kinds are checked against the primary platform (where they are
/// embedded) and fail hard. Rule keys are filtered for every platform of the
/// plan and only produce warnings.
pub fn validate_plan(app_name: &str, plan: &BuildPlan, matrix: &CapabilityMatrix) -> Result<PlanReport> {
    let app_name = sanitize_app_name(app_name)?;
    matrix.validate_extensions(plan.platform, &plan.extension_kinds())?;

    let mut report = PlanReport {
        app_name,
        ..Default::default()
    };
    for platform in plan.platform_set() {
        let outcome = matrix.filter_capabilities(platform, &plan.rule_keys);
        report.warnings.extend(outcome.warnings);
        report.rule_keys.insert(platform, outcome.keys);
    }

    tracing::debug!(
        app = %report.app_name,
        platforms = report.rule_keys.len(),
        warnings = report.warnings.len(),
        "plan validated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ExtensionSpec;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitizes_app_names() {
        assert_eq!(sanitize_app_name("Habit Tracker!").expect("valid"), "HabitTracker");
        assert_eq!(sanitize_app_name("2048 Game").expect("valid"), "App2048Game");
        assert!(matches!(
            sanitize_app_name("  ✨ "),
            Err(ForgeError::InvalidAppName(_))
        ));
    }

    #[test]
    fn collects_warnings_per_platform() {
        let plan = BuildPlan {
            platform: Platform::Ios,
            platforms: vec![Platform::Ios, Platform::Tvos],
            rule_keys: vec!["camera".into(), "notifications".into()],
            ..Default::default()
        };
        let report =
            validate_plan("Demo", &plan, &CapabilityMatrix::builtin()).expect("plan is valid");
        assert_eq!(report.rule_keys[&Platform::Ios], vec!["camera", "notifications"]);
        assert_eq!(report.rule_keys[&Platform::Tvos], vec!["notifications"]);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn rejects_extension_unsupported_on_primary() {
        let plan = BuildPlan {
            platform: Platform::Watchos,
            extensions: vec![ExtensionSpec {
                kind: "app_clip".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = validate_plan("Demo", &plan, &CapabilityMatrix::builtin())
            .expect_err("app clips are iOS only");
        assert!(err.to_string().contains("app_clip"));
    }
}
