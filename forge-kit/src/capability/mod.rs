//! Platform capability knowledge
//!
//! The [`CapabilityMatrix`] records, per platform, which rule keys are
//! unsupported, which behave differently (with a caveat), and which
//! extension kinds cannot be embedded. It is plain data: build it once with
//! [`CapabilityMatrix::builtin`] or load it from TOML, then pass it by
//! reference to the filter and the compiler.

pub mod defaults;
pub mod filter;
pub mod matrix;

pub use defaults::{CapabilityDefaults, capability_defaults};
pub use filter::FilterOutcome;
pub use matrix::{CapabilityMatrix, PlatformCapabilities};
