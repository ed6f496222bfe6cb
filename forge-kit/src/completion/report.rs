//! Completion report and its text renderings.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Verification result for one planned file that is not valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    /// Path as planned
    pub path: String,
    /// Where the file was found, or where it was expected
    pub resolved_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<String>,
    pub reason: String,
}

/// Result of one verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileCompletionReport {
    pub total: usize,
    pub valid: usize,
    /// Sorted by planned path
    pub missing: Vec<FileStatus>,
    /// Sorted by planned path
    pub invalid: Vec<FileStatus>,
    pub complete: bool,
}

impl FileCompletionReport {
    /// Grouped human-readable listing of missing and invalid files.
    ///
    /// Empty when the report is complete.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        if !self.missing.is_empty() {
            out.push_str("Missing files:\n");
            for status in &self.missing {
                let _ = writeln!(out, "- {}", status.path);
            }
        }
        if !self.invalid.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Invalid files:\n");
            for status in &self.invalid {
                let _ = writeln!(out, "- {}: {}", status.path, status.reason);
            }
        }
        out
    }
}

/// Deterministic follow-up prompt asking the materializer to finish the
/// files of an incomplete report.
pub fn render_retry_prompt(app_name: &str, report: &FileCompletionReport, pass: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Generation of {app_name} is incomplete after pass {pass}: {} of {} planned files are valid.",
        report.valid, report.total
    );
    out.push_str("Write complete Swift source for each file below. Do not leave placeholders.\n");

    if !report.missing.is_empty() {
        out.push_str("\nCreate these missing files:\n");
        for status in &report.missing {
            let _ = write!(out, "- {}", status.resolved_path.display());
            if let Some(expected) = &status.expected_type {
                let _ = write!(out, " (must declare `{expected}`)");
            }
            out.push('\n');
        }
    }

    if !report.invalid.is_empty() {
        out.push_str("\nFix these files:\n");
        for status in &report.invalid {
            let _ = write!(out, "- {}: {}", status.resolved_path.display(), status.reason);
            if let Some(expected) = &status.expected_type {
                let _ = write!(out, " (must declare `{expected}`)");
            }
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report() -> FileCompletionReport {
        FileCompletionReport {
            total: 3,
            valid: 1,
            missing: vec![FileStatus {
                path: "Views/A.swift".into(),
                resolved_path: PathBuf::from("/p/App/Views/A.swift"),
                expected_type: Some("A".into()),
                reason: "missing".into(),
            }],
            invalid: vec![FileStatus {
                path: "Views/B.swift".into(),
                resolved_path: PathBuf::from("/p/App/Views/B.swift"),
                expected_type: None,
                reason: "empty file".into(),
            }],
            complete: false,
        }
    }

    #[test]
    fn summary_groups_entries() {
        assert_eq!(
            report().render_summary(),
            "Missing files:\n- Views/A.swift\n\nInvalid files:\n- Views/B.swift: empty file\n"
        );
        assert_eq!(FileCompletionReport::default().render_summary(), "");
    }

    #[test]
    fn retry_prompt_names_declarations() {
        let prompt = render_retry_prompt("App", &report(), 1);
        assert!(prompt.starts_with("Generation of App is incomplete after pass 1: 1 of 3"));
        assert!(prompt.contains("- /p/App/Views/A.swift (must declare `A`)\n"));
        assert!(prompt.contains("- /p/App/Views/B.swift: empty file\n"));
        assert_eq!(prompt, render_retry_prompt("App", &report(), 1));
    }
}
