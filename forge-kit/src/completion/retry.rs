//! Bounded retry decision and the caller-driven completion loop.
//!
//! The core never waits or sleeps between passes. Each pass is a fresh
//! verification, and the only side effects come from the [`Materializer`]
//! the caller supplies.

use serde::Serialize;
use std::path::Path;

use super::report::{FileCompletionReport, render_retry_prompt};
use super::verifier::verify_files;
use crate::error::{ForgeError, Result};
use crate::plan::BuildPlan;

/// Decide whether another pass should run.
///
/// - complete report: `Ok(false)`
/// - incomplete, `pass < max_passes`: `Ok(true)`
/// - incomplete, budget exhausted: [`ForgeError::Incomplete`] with the
///   rendered summary
pub fn should_retry(report: &FileCompletionReport, pass: u32, max_passes: u32) -> Result<bool> {
    if report.complete {
        return Ok(false);
    }
    if pass < max_passes {
        tracing::debug!(pass, max_passes, "completion pass incomplete, retrying");
        return Ok(true);
    }
    Err(ForgeError::Incomplete {
        passes: pass,
        summary: report.render_summary(),
    })
}

/// Token and cost accounting reported by a materializer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

impl Usage {
    pub fn add(&mut self, other: Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cost_usd += other.cost_usd;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaterializeRequest<'a> {
    pub prompt: &'a str,
    pub work_dir: &'a Path,
    /// Session to resume, if a previous pass started one
    pub session_id: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterializeOutcome {
    pub session_id: String,
    pub usage: Usage,
}

/// The generation service that writes files into the project directory.
///
/// Implementations own the agent protocol; the core only hands over a
/// prompt and a directory.
pub trait Materializer {
    fn materialize(&mut self, request: MaterializeRequest<'_>) -> Result<MaterializeOutcome>;
}

/// Outcome of a completed loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionSummary {
    /// Verification passes run
    pub passes: u32,
    pub report: FileCompletionReport,
    pub session_id: Option<String>,
    pub usage: Usage,
}

/// Verify, and while incomplete ask `materializer` to fix the reported
/// files, up to `max_passes` verifications.
pub fn run_completion_loop<M: Materializer + ?Sized>(
    materializer: &mut M,
    project_dir: &Path,
    app_name: &str,
    plan: &BuildPlan,
    max_passes: u32,
) -> Result<CompletionSummary> {
    let mut session_id: Option<String> = None;
    let mut usage = Usage::default();
    let mut pass = 1;

    loop {
        let report = verify_files(project_dir, app_name, plan);
        if !should_retry(&report, pass, max_passes)? {
            tracing::info!(passes = pass, files = report.total, "generation complete");
            return Ok(CompletionSummary {
                passes: pass,
                report,
                session_id,
                usage,
            });
        }

        let prompt = render_retry_prompt(app_name, &report, pass);
        let outcome = materializer.materialize(MaterializeRequest {
            prompt: &prompt,
            work_dir: project_dir,
            session_id: session_id.as_deref(),
        })?;
        tracing::debug!(
            pass,
            session = %outcome.session_id,
            input_tokens = outcome.usage.input_tokens,
            output_tokens = outcome.usage.output_tokens,
            "materializer pass finished"
        );
        usage.add(outcome.usage);
        session_id = Some(outcome.session_id);
        pass += 1;
    }
}
