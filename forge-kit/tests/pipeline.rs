//! End-to-end pipeline behavior: intent -> plan -> filter -> descriptor -> verification.

use appforge_kit::completion::{PLACEHOLDER_SOURCE, render_retry_prompt};
use appforge_kit::descriptor::{PropertyValue, scaffold_sources, write_project};
use appforge_kit::intent::clamp_confidence;
use appforge_kit::{
    BuildPlan, CapabilityMatrix, DescriptorCompiler, ErrorClass, ForgeConfig, ForgeError,
    IntentDecision, Operation, Platform, WatchShape, parse_intent, render_yaml, should_retry,
    validate_plan, verify_files,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn compile_yaml(app: &str, plan: &BuildPlan) -> String {
    let config = ForgeConfig::default();
    let matrix = CapabilityMatrix::builtin();
    let descriptor = DescriptorCompiler::new(&config, &matrix)
        .compile(app, plan)
        .expect("plan compiles");
    render_yaml(&descriptor).expect("descriptor renders")
}

// ─────────────────────────────────────────────────────────────────────────────
// Intent normalization
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn unknown_operation_and_platform_fall_back_to_defaults() {
    let defaults = IntentDecision::default();
    let decision = parse_intent(
        r#"{"operation": "teleport", "platform": "toaster", "confidence": 7}"#,
        &defaults,
    )
    .expect("well-formed intent never fails");
    assert_eq!(decision.operation, Operation::Build);
    assert_eq!(decision.platform, Platform::Ios);
    assert_eq!(decision.confidence, 1.0);
}

#[test]
fn platform_list_order_is_preserved_without_duplicates() {
    let decision = parse_intent(
        r#"{"platforms": ["nintendo", "tvOS", "ios", "tvos", "visionOS"]}"#,
        &IntentDecision::default(),
    )
    .expect("parses");
    assert_eq!(decision.platform, Platform::Tvos);
    assert_eq!(
        decision.platforms,
        vec![Platform::Tvos, Platform::Ios, Platform::Visionos]
    );
}

#[test]
fn watch_without_shape_is_standalone() {
    let decision = parse_intent(r#"{"platform": "watchOS"}"#, &IntentDecision::default())
        .expect("parses");
    assert_eq!(decision.watch_shape, Some(WatchShape::Standalone));
}

#[test]
fn clamp_is_bounded_and_idempotent() {
    for value in [-3.5, 0.0, 0.42, 1.0, 12.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let once = clamp_confidence(value);
        assert!((0.0..=1.0).contains(&once), "{value} -> {once}");
        assert_eq!(clamp_confidence(once), once);
    }
}

#[test]
fn malformed_intent_is_an_input_error() {
    let err = parse_intent("{not json", &IntentDecision::default()).expect_err("syntax error");
    assert_eq!(err.class(), ErrorClass::MalformedInput);
}

// ─────────────────────────────────────────────────────────────────────────────
// Capability filtering
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn filtered_keys_never_include_unsupported() {
    let matrix = CapabilityMatrix::builtin();
    let record = matrix.for_platform(Platform::Watchos);
    let requested = ["camera", "haptics", "NFC", "healthkit", "", "arkit", "maps"];

    let outcome = matrix.filter_capabilities(Platform::Watchos, &requested);
    assert!(outcome.keys.iter().all(|key| !record.is_unsupported(key)));
    assert!(outcome.warnings.len() >= outcome.removed.len());
    assert_eq!(outcome.removed, vec!["camera", "NFC", "arkit"]);
    assert_eq!(outcome.keys, vec!["haptics", "healthkit", "maps"]);
}

#[test]
fn unsupported_extension_is_named_in_error() {
    let matrix = CapabilityMatrix::builtin();
    let err = matrix
        .validate_extensions(Platform::Tvos, &["widget", "share"])
        .expect_err("tvOS cannot embed share extensions");
    assert!(err.to_string().contains("share"), "{err}");
    assert_eq!(err.class(), ErrorClass::SemanticValidation);
}

// ─────────────────────────────────────────────────────────────────────────────
// Descriptor compilation
// ─────────────────────────────────────────────────────────────────────────────

const FULL_PLAN: &str = r#"{
    "platform": "ios",
    "platforms": ["ios", "watchos"],
    "device_family": "universal",
    "files": [{"path": "Views/HomeView.swift", "type_name": "HomeView"}],
    "permissions": [{"key": "NSCameraUsageDescription", "description": "Scan receipts"}],
    "extensions": [{"kind": "widget"}, {"kind": ""}, {"kind": "share", "name": "Share It"}],
    "rule_keys": ["push", "camera"],
    "localizations": ["en", "fr"],
    "monetization": {
        "products": [{"id": "pro.monthly", "type": "subscription", "price": 4.99, "duration": "monthly"}],
        "entitlement": "Pro"
    }
}"#;

#[test]
fn compiling_twice_is_byte_identical() {
    let plan = BuildPlan::from_json(FULL_PLAN).expect("plan decodes");
    let first = compile_yaml("Receipts", &plan);
    let second = compile_yaml("Receipts", &plan);
    assert_eq!(first, second);
}

#[test]
fn empty_extension_kind_never_yields_empty_bundle_segment() {
    let plan = BuildPlan::from_json(FULL_PLAN).expect("plan decodes");
    let config = ForgeConfig::default();
    let matrix = CapabilityMatrix::builtin();
    let descriptor = DescriptorCompiler::new(&config, &matrix)
        .compile("Receipts", &plan)
        .expect("compiles");
    for target in descriptor.targets() {
        assert!(!target.bundle_id.ends_with('.'), "{}", target.bundle_id);
        assert!(!target.bundle_id.split('.').any(str::is_empty), "{}", target.bundle_id);
    }
}

#[test]
fn ipad_only_plan_has_tablet_filter() {
    let plan = BuildPlan::from_json(r#"{"platform": "ios", "device_family": "tablet-only"}"#)
        .expect("plan decodes");
    let config = ForgeConfig::default();
    let matrix = CapabilityMatrix::builtin();
    let descriptor = DescriptorCompiler::new(&config, &matrix)
        .compile("Sketch", &plan)
        .expect("compiles");

    assert_eq!(descriptor.targets().len(), 1);
    let app = &descriptor.targets()[0];
    assert_eq!(app.settings["TARGETED_DEVICE_FAMILY"], PropertyValue::from("2"));
    assert!(!app.settings.keys().any(|key| key.ends_with("_iPhone")));

    let yaml = compile_yaml("Sketch", &plan);
    assert!(yaml.contains("TARGETED_DEVICE_FAMILY"), "{yaml}");
    assert!(!yaml.contains("UISupportedInterfaceOrientations_iPhone"), "{yaml}");
}

#[test]
fn paired_watch_plan_has_host_companion_and_runtime() {
    let plan = BuildPlan::from_json(r#"{"platform": "watchos", "watch_project_shape": "paired_ios"}"#)
        .expect("plan decodes");
    let config = ForgeConfig::default();
    let matrix = CapabilityMatrix::builtin();
    let descriptor = DescriptorCompiler::new(&config, &matrix)
        .compile("Pulse", &plan)
        .expect("compiles");

    assert_eq!(descriptor.targets().len(), 3);
    let host = descriptor.target("Pulse").expect("host");
    let companion = descriptor.target("PulseWatch").expect("companion");
    assert!(descriptor.target("PulseWatchExtension").is_some());
    assert_eq!(host.target_edges().collect::<Vec<_>>(), vec!["PulseWatch"]);
    assert_eq!(
        companion.target_edges().collect::<Vec<_>>(),
        vec!["PulseWatchExtension"]
    );
}

#[test]
fn invalid_watch_shape_is_rejected() {
    let err = BuildPlan::from_json(r#"{"platform": "watchos", "watch_project_shape": "wristband"}"#)
        .expect_err("unknown shape");
    assert!(matches!(err, ForgeError::InvalidWatchShape { .. }));
}

#[test]
fn validate_plan_collects_warnings_per_platform() {
    let plan = BuildPlan::from_json(FULL_PLAN).expect("plan decodes");
    let report = validate_plan("Receipts", &plan, &CapabilityMatrix::builtin()).expect("valid");
    assert_eq!(report.app_name, "Receipts");
    assert_eq!(report.rule_keys[&Platform::Ios], vec!["push", "camera"]);
    assert_eq!(report.rule_keys[&Platform::Watchos], vec!["push"]);
    assert!(report.warnings.iter().any(|w| w.contains("'camera'")));
}

// ─────────────────────────────────────────────────────────────────────────────
// Writing and verification
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scaffolded_placeholder_is_reported_invalid() {
    let dir = TempDir::new().expect("temp dir");
    let plan = BuildPlan::from_json(
        r#"{"platform": "ios", "files": [{"path": "Views/HomeView.swift", "type_name": "HomeView"}]}"#,
    )
    .expect("plan decodes");
    let config = ForgeConfig::default();
    let matrix = CapabilityMatrix::builtin();
    let descriptor = DescriptorCompiler::new(&config, &matrix)
        .compile("Notes", &plan)
        .expect("compiles");

    let written = write_project(dir.path(), "project.yml", &descriptor, &plan).expect("writes");
    assert_eq!(written, vec![dir.path().join("project.yml")]);
    let created = scaffold_sources(dir.path(), &descriptor, &plan).expect("scaffolds");
    assert_eq!(created, vec![dir.path().join("Notes/Views/HomeView.swift")]);
    assert_eq!(
        std::fs::read_to_string(&created[0]).expect("read placeholder"),
        PLACEHOLDER_SOURCE
    );

    let report = verify_files(dir.path(), "Notes", &plan);
    assert!(!report.complete);
    assert!(report.missing.is_empty());
    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].reason, "placeholder-only content");

    let prompt = render_retry_prompt("Notes", &report, 1);
    assert!(prompt.contains("(must declare `HomeView`)"), "{prompt}");

    std::fs::write(&created[0], "import SwiftUI\n\nstruct HomeView: View {}\n").expect("write");
    assert!(verify_files(dir.path(), "Notes", &plan).complete);
}

#[test]
fn storekit_file_written_with_monetization() {
    let dir = TempDir::new().expect("temp dir");
    let plan = BuildPlan::from_json(FULL_PLAN).expect("plan decodes");
    let config = ForgeConfig::default();
    let matrix = CapabilityMatrix::builtin();
    let descriptor = DescriptorCompiler::new(&config, &matrix)
        .compile("Receipts", &plan)
        .expect("compiles");

    let written = write_project(dir.path(), "project.yml", &descriptor, &plan).expect("writes");
    assert_eq!(written.len(), 2);
    let storekit = std::fs::read_to_string(&written[1]).expect("read storekit");
    assert!(storekit.contains("pro.monthly"));
    assert!(storekit.contains("P1M"));
}

#[test]
fn should_retry_respects_pass_budget() {
    let dir = TempDir::new().expect("temp dir");
    let plan = BuildPlan::from_json(r#"{"files": [{"path": "A.swift"}]}"#).expect("decodes");
    let report = verify_files(dir.path(), "App", &plan);
    assert!(!report.complete);

    assert!(should_retry(&report, 1, 3).expect("budget left"));
    let err = should_retry(&report, 3, 3).expect_err("budget exhausted");
    assert_eq!(err.class(), ErrorClass::Completion);
    assert!(err.to_string().contains("Missing files:\n- A.swift"), "{err}");
}
