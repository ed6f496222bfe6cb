//! Planned-file verification against a materialized project directory.

use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::report::{FileCompletionReport, FileStatus};
use crate::plan::{BuildPlan, FileSpec, sanitize_app_name};

/// Canonical body written for planned files that have not been generated
pub const PLACEHOLDER_SOURCE: &str = "// Placeholder: this file has not been generated yet.\n";

pub const REASON_MISSING: &str = "missing";
pub const REASON_NOT_FILE: &str = "not a regular file";
pub const REASON_EMPTY: &str = "empty file";
pub const REASON_PLACEHOLDER: &str = "placeholder-only content";

fn declaration_regex() -> Option<&'static Regex> {
    static DECLARATION: OnceLock<Option<Regex>> = OnceLock::new();
    DECLARATION
        .get_or_init(|| {
            // A declaration starts its line, after optional attributes and modifiers
            Regex::new(
                r"(?m)^[ \t]*(?:(?:@\w+|public|private|internal|fileprivate|open|final|indirect)[ \t]+)*(?:struct|class|enum|protocol|extension|actor)[ \t]+\w",
            )
            .ok()
        })
        .as_ref()
}

/// Whether `content` is a placeholder rather than real source: the
/// canonical placeholder body, or a mention of "placeholder" with no type
/// declaration anywhere.
pub fn is_placeholder_only(content: &str) -> bool {
    let trimmed = content.trim();
    if trimmed == PLACEHOLDER_SOURCE.trim() {
        return true;
    }
    if !trimmed.to_ascii_lowercase().contains("placeholder") {
        return false;
    }
    !declaration_regex().is_some_and(|re| re.is_match(trimmed))
}

fn project_dir_name(app_name: &str) -> String {
    sanitize_app_name(app_name).unwrap_or_else(|_| app_name.trim().to_string())
}

/// On-disk locations tried for a planned path, in order: the literal path
/// under the project root, then `<root>/<App><suffix>/<path>` for each
/// platform of the plan (primary first).
pub fn resolve_candidates(
    project_dir: &Path,
    app_name: &str,
    plan: &BuildPlan,
    relative: &str,
) -> Vec<PathBuf> {
    let relative = relative.trim().trim_start_matches('/');
    let app = project_dir_name(app_name);
    let multi = plan.is_multi_platform();

    let mut candidates = vec![project_dir.join(relative)];
    for platform in plan.platform_set() {
        let candidate = project_dir
            .join(format!("{app}{}", platform.source_suffix(multi)))
            .join(relative);
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

enum Check {
    Valid,
    Missing,
    Invalid(String),
}

fn check_file(path: &Path, expected_type: Option<&str>) -> Check {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Check::Missing,
        Err(e) => return Check::Invalid(format!("unreadable: {e}")),
    };
    if !metadata.is_file() {
        return Check::Invalid(REASON_NOT_FILE.to_string());
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => return Check::Invalid(format!("unreadable: {e}")),
    };
    if content.trim().is_empty() {
        return Check::Invalid(REASON_EMPTY.to_string());
    }
    if is_placeholder_only(&content) {
        return Check::Invalid(REASON_PLACEHOLDER.to_string());
    }
    if let Some(expected) = expected_type {
        if !content.contains(expected) {
            return Check::Invalid(format!("missing declaration for `{expected}`"));
        }
    }
    Check::Valid
}

fn status(spec: &FileSpec, resolved: PathBuf, reason: &str) -> FileStatus {
    FileStatus {
        path: spec.path.clone(),
        resolved_path: resolved,
        expected_type: spec.expected_type().map(str::to_string),
        reason: reason.to_string(),
    }
}

/// Verify every planned file under `project_dir`.
///
/// Never fails: unreadable files are reported as invalid with the I/O error
/// in the reason.
pub fn verify_files(project_dir: &Path, app_name: &str, plan: &BuildPlan) -> FileCompletionReport {
    let mut report = FileCompletionReport {
        total: plan.files.len(),
        ..Default::default()
    };

    for spec in &plan.files {
        let candidates = resolve_candidates(project_dir, app_name, plan, &spec.path);
        let found = candidates
            .iter()
            .find(|candidate| candidate.symlink_metadata().is_ok())
            .cloned();

        let Some(resolved) = found else {
            // Report where the file was expected: the primary platform directory
            let expected = candidates
                .get(1)
                .or_else(|| candidates.first())
                .cloned()
                .unwrap_or_else(|| project_dir.join(&spec.path));
            report.missing.push(status(spec, expected, REASON_MISSING));
            continue;
        };

        match check_file(&resolved, spec.expected_type()) {
            Check::Valid => report.valid += 1,
            Check::Missing => report.missing.push(status(spec, resolved, REASON_MISSING)),
            Check::Invalid(reason) => report.invalid.push(status(spec, resolved, &reason)),
        }
    }

    report.missing.sort_by(|a, b| a.path.cmp(&b.path));
    report.invalid.sort_by(|a, b| a.path.cmp(&b.path));
    report.complete =
        report.valid == report.total && report.missing.is_empty() && report.invalid.is_empty();

    tracing::debug!(
        total = report.total,
        valid = report.valid,
        missing = report.missing.len(),
        invalid = report.invalid.len(),
        "verified planned files"
    );
    report
}
