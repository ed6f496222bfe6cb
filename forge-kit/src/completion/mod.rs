//! Completion verification
//!
//! After an external materializer writes the planned files, the verifier
//! checks each one (exists, regular file, non-empty, not a placeholder,
//! declares its planned type) and the retry controller decides whether
//! another pass is allowed.

pub mod report;
pub mod retry;
pub mod verifier;

pub use report::{FileCompletionReport, FileStatus, render_retry_prompt};
pub use retry::{
    CompletionSummary, MaterializeOutcome, MaterializeRequest, Materializer, Usage,
    run_completion_loop, should_retry,
};
pub use verifier::{PLACEHOLDER_SOURCE, is_placeholder_only, resolve_candidates, verify_files};
