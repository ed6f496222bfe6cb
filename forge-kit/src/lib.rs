//! App generation pipeline core
//!
//! Turns loosely structured planner output into a deterministic Xcode
//! project description, then checks that generated sources are complete.
//!
//! Pipeline phases:
//! 1. [`intent`]: normalize the intent step's JSON into an [`IntentDecision`]
//! 2. [`plan`]: decode and validate a [`BuildPlan`]
//! 3. [`capability`]: drop rule keys a platform cannot honor
//! 4. [`descriptor`]: compile a [`ProjectDescriptor`] and render XcodeGen YAML
//! 5. [`completion`]: verify planned files and drive bounded retries
//!
//! Every phase is synchronous and free of global state. The only I/O lives
//! in [`descriptor::io`], [`completion::verifier`] and configuration loading.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod capability;
pub mod completion;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod intent;
pub mod plan;
pub mod types;

pub use capability::{CapabilityMatrix, FilterOutcome};
pub use completion::{FileCompletionReport, run_completion_loop, should_retry, verify_files};
pub use config::{ConfigLoader, ForgeConfig};
pub use descriptor::{DescriptorCompiler, ProjectDescriptor, render_yaml};
pub use error::{ErrorClass, ForgeError, Result};
pub use intent::{IntentDecision, parse_intent};
pub use plan::{BuildPlan, PlanReport, validate_plan};
pub use types::{DeviceFamily, ExtensionKind, Operation, Platform, WatchShape};

/// Appforge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
