//! Appforge CLI Commands
//!
//! Headless adapters over `appforge_kit`, one subcommand per pipeline phase.
//!
//! ## Commands
//!
//! - `appforge intent [--input FILE] [--json]`
//! - `appforge filter --platform P [KEY...] [--json]`
//! - `appforge check --plan FILE --app NAME [--json]`
//! - `appforge compile --plan FILE --app NAME [--out DIR] [--scaffold] [--dry-run] [--json]`
//! - `appforge verify --plan FILE --app NAME [--dir DIR] [--pass N] [--json]`
//!
//! ## Exit Codes
//!
//! - 0: Success / complete
//! - 1: Retry needed (verification incomplete, pass budget left)
//! - 2: Validation failure, or incomplete after the last pass
//! - 3: Infrastructure error

use anyhow::Context;
use appforge_kit::capability::CapabilityMatrix;
use appforge_kit::completion::{render_retry_prompt, should_retry, verify_files};
use appforge_kit::config::{ConfigLoader, ForgeConfig};
use appforge_kit::descriptor::{DescriptorCompiler, render_yaml, scaffold_sources, write_project};
use appforge_kit::intent::{IntentDecision, parse_intent};
use appforge_kit::plan::{BuildPlan, validate_plan};
use appforge_kit::{ForgeError, Platform};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Exit code for "verification incomplete, run another pass"
pub const EXIT_RETRY: i32 = 1;

/// Exit code for anything that is not a [`ForgeError`]
pub const EXIT_INFRASTRUCTURE: i32 = 3;

/// Appforge CLI: normalize intents, compile project descriptors, verify output
#[derive(Debug, Parser)]
#[command(name = "appforge", version)]
pub struct ForgeCli {
    /// Configuration file (defaults to ./appforge.toml or the user config dir)
    #[arg(long = "config", short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Capability matrix TOML replacing the built-in one
    #[arg(long = "capabilities", value_name = "FILE", global = true)]
    pub capabilities: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ForgeSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ForgeSubcommand {
    /// Normalize raw intent JSON
    Intent(IntentArgs),

    /// Filter rule keys for a platform
    Filter(FilterArgs),

    /// Validate a build plan without writing anything
    Check(PlanArgs),

    /// Compile a build plan into a project descriptor
    Compile(CompileArgs),

    /// Verify planned files in a materialized project
    Verify(VerifyArgs),
}

/// Arguments for `intent`
#[derive(Debug, Parser)]
pub struct IntentArgs {
    /// File holding the raw intent text (stdin when omitted or "-")
    #[arg(long = "input", short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Default platform when the intent names none
    #[arg(
        long = "default-platform",
        value_name = "PLATFORM",
        default_value = "ios",
        value_parser = parse_platform
    )]
    pub default_platform: Platform,

    /// Output as JSON instead of text
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

/// Arguments for `filter`
#[derive(Debug, Parser)]
pub struct FilterArgs {
    /// Target platform (ios, watchos, tvos, visionos, macos)
    #[arg(long = "platform", short = 'p', value_name = "PLATFORM", value_parser = parse_platform)]
    pub platform: Platform,

    /// Rule keys to filter
    #[arg(value_name = "KEY")]
    pub keys: Vec<String>,

    /// Output as JSON instead of text
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

/// Plan input shared by `check`, `compile` and `verify`
#[derive(Debug, Parser)]
pub struct PlanArgs {
    /// Build plan JSON file
    #[arg(long = "plan", value_name = "FILE")]
    pub plan: PathBuf,

    /// Application name
    #[arg(long = "app", value_name = "NAME")]
    pub app: String,

    /// Output as JSON instead of text
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

/// Arguments for `compile`
#[derive(Debug, Parser)]
pub struct CompileArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Project directory to write into
    #[arg(long = "out", short = 'o', value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Also create source directories and placeholder files
    #[arg(long = "scaffold")]
    pub scaffold: bool,

    /// Print the descriptor instead of writing it
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// Arguments for `verify`
#[derive(Debug, Parser)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Materialized project directory
    #[arg(long = "dir", short = 'd', value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Pass number of this verification (1-based)
    #[arg(long = "pass", default_value = "1")]
    pub pass: u32,
}

impl ForgeCli {
    /// Run the command and return the process exit code
    pub fn run(self) -> anyhow::Result<i32> {
        let config = match &self.config {
            Some(path) => ConfigLoader::new().with_file(path).load(),
            None => ConfigLoader::load_default(),
        }
        .map_err(ForgeError::from)?;

        let capabilities = self
            .capabilities
            .clone()
            .or_else(|| config.project.capabilities_file.clone());

        match self.command {
            ForgeSubcommand::Intent(args) => run_intent(args),
            ForgeSubcommand::Filter(args) => {
                let matrix = CapabilityMatrix::load(capabilities.as_deref())?;
                run_filter(&matrix, args)
            }
            ForgeSubcommand::Check(args) => {
                let matrix = CapabilityMatrix::load(capabilities.as_deref())?;
                run_check(&matrix, args)
            }
            ForgeSubcommand::Compile(args) => {
                let matrix = CapabilityMatrix::load(capabilities.as_deref())?;
                run_compile(&config, &matrix, args)
            }
            ForgeSubcommand::Verify(args) => run_verify(&config, args),
        }
    }
}

/// Exit code for an error returned by [`ForgeCli::run`]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ForgeError>()
        .map(|forge| forge.class().exit_code())
        .unwrap_or(EXIT_INFRASTRUCTURE)
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    Platform::from_hint(value).ok_or_else(|| {
        format!("unknown platform '{value}' (valid: ios, watchos, tvos, visionos, macos)")
    })
}

fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => read_file(path),
        _ => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        ForgeError::FileRead {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

fn load_plan(path: &Path) -> anyhow::Result<BuildPlan> {
    Ok(BuildPlan::from_json(&read_file(path)?)?)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run the intent command
fn run_intent(args: IntentArgs) -> anyhow::Result<i32> {
    let defaults = IntentDecision::for_platform(args.default_platform);
    let raw = read_input(args.input.as_deref())?;
    let decision = parse_intent(&raw, &defaults)?;

    if args.json {
        print_json(&decision)?;
    } else {
        println!("operation:  {}", decision.operation.as_str());
        let platforms: Vec<&str> = decision
            .platform_set()
            .iter()
            .map(Platform::display_name)
            .collect();
        println!("platforms:  {}", platforms.join(", "));
        if let Some(family) = decision.device_family {
            println!("device:     {}", family.as_str());
        }
        if let Some(shape) = decision.watch_shape {
            println!("watch:      {}", shape.as_str());
        }
        println!("confidence: {:.2}", decision.confidence);
        if !decision.reason.is_empty() {
            println!("reason:     {}", decision.reason);
        }
    }
    Ok(0)
}

/// Run the filter command
fn run_filter(matrix: &CapabilityMatrix, args: FilterArgs) -> anyhow::Result<i32> {
    let platform = args.platform;
    let outcome = matrix.filter_capabilities(platform, args.keys.as_slice());

    if args.json {
        print_json(&serde_json::json!({
            "platform": platform.as_str(),
            "keys": outcome.keys,
            "removed": outcome.removed,
            "warnings": outcome.warnings,
        }))?;
    } else {
        for key in &outcome.keys {
            println!("{key}");
        }
        for warning in &outcome.warnings {
            eprintln!("warning: {warning}");
        }
    }
    Ok(0)
}

/// Run the check command
fn run_check(matrix: &CapabilityMatrix, args: PlanArgs) -> anyhow::Result<i32> {
    let plan = load_plan(&args.plan)?;
    let report = validate_plan(&args.app, &plan, matrix)?;

    if args.json {
        print_json(&report)?;
    } else {
        println!("{}: plan is valid", report.app_name);
        for (platform, keys) in &report.rule_keys {
            if !keys.is_empty() {
                println!("  {}: {}", platform.display_name(), keys.join(", "));
            }
        }
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
    }
    Ok(0)
}

/// Run the compile command
fn run_compile(
    config: &ForgeConfig,
    matrix: &CapabilityMatrix,
    args: CompileArgs,
) -> anyhow::Result<i32> {
    let plan = load_plan(&args.plan.plan)?;
    let report = validate_plan(&args.plan.app, &plan, matrix)?;
    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }

    let descriptor = DescriptorCompiler::new(config, matrix).compile(&report.app_name, &plan)?;

    if args.dry_run {
        print!("{}", render_yaml(&descriptor)?);
        return Ok(0);
    }

    let mut written = write_project(
        &args.out,
        &config.project.descriptor_file,
        &descriptor,
        &plan,
    )?;
    if args.scaffold {
        written.extend(scaffold_sources(&args.out, &descriptor, &plan)?);
    }

    if args.plan.json {
        let targets: Vec<&str> = descriptor
            .targets()
            .iter()
            .map(|target| target.name.as_str())
            .collect();
        print_json(&serde_json::json!({
            "app_name": report.app_name,
            "targets": targets,
            "written": written,
            "warnings": report.warnings,
        }))?;
    } else {
        for path in &written {
            println!("wrote {}", path.display());
        }
    }
    Ok(0)
}

/// Run the verify command
fn run_verify(config: &ForgeConfig, args: VerifyArgs) -> anyhow::Result<i32> {
    let plan = load_plan(&args.plan.plan)?;
    let report = verify_files(&args.dir, &args.plan.app, &plan);
    let max_passes = config.completion.max_passes;

    let retry = match should_retry(&report, args.pass, max_passes) {
        Ok(retry) => retry,
        Err(err) => {
            if args.plan.json {
                print_json(&report)?;
            }
            return Err(err.into());
        }
    };

    if args.plan.json {
        print_json(&serde_json::json!({
            "pass": args.pass,
            "max_passes": max_passes,
            "retry": retry,
            "report": report,
        }))?;
    } else if report.complete {
        println!("{} of {} planned files valid", report.valid, report.total);
    } else {
        print!("{}", render_retry_prompt(&args.plan.app, &report, args.pass));
    }

    Ok(if retry { EXIT_RETRY } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_kit::ErrorClass;

    #[test]
    fn forge_errors_map_to_class_exit_codes() {
        let err: anyhow::Error = ForgeError::InvalidAppName("!!".into()).into();
        assert_eq!(exit_code_for(&err), ErrorClass::SemanticValidation.exit_code());

        let err: anyhow::Error = ForgeError::Incomplete {
            passes: 3,
            summary: String::new(),
        }
        .into();
        assert_eq!(exit_code_for(&err), 2);

        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), EXIT_INFRASTRUCTURE);
    }

    #[test]
    fn platform_argument_accepts_aliases() {
        assert_eq!(parse_platform("watchOS").expect("known"), Platform::Watchos);
        assert!(parse_platform("toaster").is_err());
    }

    #[test]
    fn cli_parses_compile_flags() {
        let cli = ForgeCli::try_parse_from([
            "appforge", "compile", "--plan", "plan.json", "--app", "Demo", "--dry-run",
        ])
        .expect("parses");
        match cli.command {
            ForgeSubcommand::Compile(args) => {
                assert!(args.dry_run);
                assert_eq!(args.plan.app, "Demo");
                assert_eq!(args.out, PathBuf::from("."));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
