//! Command-line adapter for the appforge pipeline.

pub mod forge_cmd;

pub use forge_cmd::{ForgeCli, ForgeSubcommand, exit_code_for};
