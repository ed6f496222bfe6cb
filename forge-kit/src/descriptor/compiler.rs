//! Build plan to project descriptor compilation.
//!
//! [`DescriptorCompiler::compile`] is a pure function of the configuration,
//! the capability matrix and the plan: no I/O, no clocks, and every map is
//! key-ordered, so compiling the same plan twice renders identical bytes.

use std::collections::{BTreeMap, BTreeSet};

use super::bundle::{
    WATCH_APP_SUFFIX, WATCH_EXTENSION_SUFFIX, app_bundle_id, child, platform_token, sanitize_token,
    token_or,
};
use super::extension::{extension_defaults, kind_token};
use super::model::{
    Dependency, PackageRef, ProjectDescriptor, ProjectOptions, Scheme, SourceRoot, Target,
    TargetType,
};
use super::property::{PropertyMap, PropertyValue, append_unique, map_from_json, merge_properties};
use super::storekit::{STOREKIT_FILE_NAME, has_products};
use crate::capability::{CapabilityMatrix, capability_defaults};
use crate::config::ForgeConfig;
use crate::error::Result;
use crate::plan::{BuildPlan, ExtensionSpec, sanitize_app_name};
use crate::types::{DeviceFamily, Platform, WatchShape};

const ORIENTATIONS_IPHONE_KEY: &str = "INFOPLIST_KEY_UISupportedInterfaceOrientations_iPhone";
const ORIENTATIONS_IPAD_KEY: &str = "INFOPLIST_KEY_UISupportedInterfaceOrientations_iPad";
const IPHONE_ORIENTATIONS: &str =
    "UIInterfaceOrientationPortrait UIInterfaceOrientationLandscapeLeft UIInterfaceOrientationLandscapeRight";
const IPAD_ORIENTATIONS: &str = "UIInterfaceOrientationPortrait UIInterfaceOrientationPortraitUpsideDown UIInterfaceOrientationLandscapeLeft UIInterfaceOrientationLandscapeRight";

/// Build settings selected by an iOS device family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFamilyRow {
    pub targeted_device_family: &'static str,
    pub iphone_orientations: bool,
    pub ipad_orientations: bool,
}

/// The fixed device-family table
pub fn device_family_row(family: DeviceFamily) -> DeviceFamilyRow {
    match family {
        DeviceFamily::Iphone => DeviceFamilyRow {
            targeted_device_family: "1",
            iphone_orientations: true,
            ipad_orientations: false,
        },
        DeviceFamily::Ipad => DeviceFamilyRow {
            targeted_device_family: "2",
            iphone_orientations: false,
            ipad_orientations: true,
        },
        DeviceFamily::Universal => DeviceFamilyRow {
            targeted_device_family: "1,2",
            iphone_orientations: true,
            ipad_orientations: true,
        },
    }
}

/// Compiles validated build plans into project descriptors
pub struct DescriptorCompiler<'a> {
    config: &'a ForgeConfig,
    matrix: &'a CapabilityMatrix,
}

/// Working state for one compilation
struct Layout {
    app_name: String,
    base_bundle_id: String,
    multi_platform: bool,
    targets: Vec<Target>,
    /// Target hosting the primary platform's extensions
    extension_host: Option<String>,
    /// Target the scheme runs
    primary_app: Option<String>,
}

impl Layout {
    fn has_target(&self, name: &str) -> bool {
        self.targets.iter().any(|target| target.name == name)
    }

    fn target_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.iter_mut().find(|target| target.name == name)
    }
}

impl<'a> DescriptorCompiler<'a> {
    pub fn new(config: &'a ForgeConfig, matrix: &'a CapabilityMatrix) -> Self {
        Self { config, matrix }
    }

    /// Compile `plan` for the app called `app_name`.
    ///
    /// Expects a plan that passed [`crate::plan::validate_plan`]. Missing
    /// optional fields are filled with platform defaults; extension kinds
    /// that slipped through validation become plain app extensions.
    pub fn compile(&self, app_name: &str, plan: &BuildPlan) -> Result<ProjectDescriptor> {
        let app_name = sanitize_app_name(app_name)?;
        let platforms = plan.platform_set();
        let mut layout = Layout {
            base_bundle_id: app_bundle_id(&self.config.project.bundle_id_prefix, &app_name),
            app_name,
            multi_platform: platforms.len() > 1,
            targets: Vec::new(),
            extension_host: None,
            primary_app: None,
        };

        match plan.watch_pairing() {
            Some(WatchShape::Paired) => self.add_paired_watch(&mut layout, plan),
            Some(WatchShape::Standalone) => self.add_watch_app(&mut layout, plan, None),
            None => {}
        }
        for platform in &platforms {
            if matches!(platform, Platform::Watchos) {
                continue;
            }
            // Paired projects already carry the iOS host
            if *platform == Platform::Ios && layout.has_target(&layout.app_name) {
                continue;
            }
            self.add_app(&mut layout, plan, *platform);
        }

        self.apply_app_properties(&mut layout, plan);
        let has_extensions = !plan.extensions.is_empty();
        self.add_extensions(&mut layout, plan);

        if layout.multi_platform {
            let shared = self.config.project.shared_source_dir.trim();
            if !shared.is_empty() {
                for target in &mut layout.targets {
                    target.sources.push(SourceRoot::optional(shared));
                }
            }
        }

        let packages = self.attach_packages(&mut layout, plan);
        let storekit = has_products(plan.monetization.as_ref()).then(|| {
            let dir = layout
                .primary_app
                .as_deref()
                .and_then(|name| layout.targets.iter().find(|t| t.name == name))
                .map(|target| target.support_dir().to_string())
                .unwrap_or_else(|| layout.app_name.clone());
            format!("{dir}/{STOREKIT_FILE_NAME}")
        });

        let options = self.project_options(plan, &layout.targets);
        let run_target = layout.primary_app.clone();
        let mut descriptor = ProjectDescriptor::new(layout.app_name.clone(), options, layout.targets)?;
        descriptor.packages = packages;

        if has_extensions || storekit.is_some() {
            if let Some(run_target) = run_target {
                let build_targets = descriptor.targets().iter().map(|t| t.name.clone()).collect();
                descriptor.add_scheme(Scheme {
                    name: layout.app_name.clone(),
                    build_targets,
                    run_target,
                    storekit_configuration: storekit,
                })?;
            }
        }

        tracing::debug!(
            app = %layout.app_name,
            targets = descriptor.targets().len(),
            schemes = descriptor.schemes().len(),
            "descriptor compiled"
        );
        Ok(descriptor)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Top-level targets
    // ─────────────────────────────────────────────────────────────────────

    fn base_target(&self, layout: &Layout, name: String, platform: Platform, kind: TargetType) -> Target {
        Target {
            sources: vec![SourceRoot::required(name.clone())],
            name,
            platform,
            target_type: kind,
            deployment_target: self.config.deployment.for_platform(platform).to_string(),
            bundle_id: layout.base_bundle_id.clone(),
            settings: PropertyMap::new(),
            info: PropertyMap::new(),
            entitlements: PropertyMap::new(),
            dependencies: Vec::new(),
        }
    }

    /// A top-level application for `platform` (everything but watchOS)
    fn add_app(&self, layout: &mut Layout, plan: &BuildPlan, platform: Platform) -> String {
        let name = format!(
            "{}{}",
            layout.app_name,
            platform.source_suffix(layout.multi_platform)
        );
        let mut target = self.base_target(layout, name.clone(), platform, TargetType::Application);
        if platform != plan.platform && layout.multi_platform {
            target.bundle_id = child(&layout.base_bundle_id, platform_token(platform));
        }

        if platform == Platform::Ios {
            let row = device_family_row(plan.effective_device_family());
            apply_device_family(&mut target.settings, row);
        } else {
            let family = platform.device_family_setting();
            if !family.is_empty() {
                target
                    .settings
                    .insert("TARGETED_DEVICE_FAMILY".into(), family.into());
            }
        }

        if platform == plan.platform {
            layout.extension_host = Some(name.clone());
            layout.primary_app = Some(name.clone());
        }
        layout.targets.push(target);
        name
    }

    /// Watch app plus its runtime extension. With a host, the watch app is
    /// embedded into it and its identifiers chain under the host's.
    fn add_watch_app(&self, layout: &mut Layout, plan: &BuildPlan, host: Option<&str>) {
        let watch_dir = format!("{}{}", layout.app_name, Platform::Watchos.source_suffix(true));
        let extension_name = format!("{watch_dir}Extension");

        let host_bundle_id = host
            .and_then(|name| layout.targets.iter().find(|t| t.name == name))
            .map(|t| t.bundle_id.clone())
            .unwrap_or_else(|| layout.base_bundle_id.clone());
        let watch_bundle_id = child(&host_bundle_id, WATCH_APP_SUFFIX);
        let extension_bundle_id = child(&watch_bundle_id, WATCH_EXTENSION_SUFFIX);

        let mut extension = self.base_target(
            layout,
            extension_name.clone(),
            Platform::Watchos,
            TargetType::WatchExtension,
        );
        extension.sources = vec![SourceRoot {
            path: watch_dir.clone(),
            optional: false,
            excludes: vec!["Resources/**".to_string()],
        }];
        extension.bundle_id = extension_bundle_id;
        let mut ns_extension = PropertyMap::new();
        ns_extension.insert(
            "NSExtensionPointIdentifier".into(),
            "com.apple.watchkit".into(),
        );
        let mut attributes = PropertyMap::new();
        attributes.insert("WKAppBundleIdentifier".into(), watch_bundle_id.clone().into());
        ns_extension.insert("NSExtensionAttributes".into(), attributes.into());
        extension.info.insert("NSExtension".into(), ns_extension.into());
        extension.settings.insert(
            "TARGETED_DEVICE_FAMILY".into(),
            Platform::Watchos.device_family_setting().into(),
        );

        let mut watch_app =
            self.base_target(layout, watch_dir.clone(), Platform::Watchos, TargetType::WatchApp);
        watch_app.sources = vec![SourceRoot::optional(format!("{watch_dir}/Resources"))];
        watch_app.bundle_id = watch_bundle_id;
        watch_app.settings.insert(
            "TARGETED_DEVICE_FAMILY".into(),
            Platform::Watchos.device_family_setting().into(),
        );
        match host {
            Some(_) => {
                watch_app.info.insert(
                    "WKCompanionAppBundleIdentifier".into(),
                    host_bundle_id.clone().into(),
                );
            }
            None => {
                watch_app.info.insert("WKWatchOnly".into(), true.into());
                watch_app.info.insert(
                    "WKRunsIndependentlyOfCompanionApp".into(),
                    true.into(),
                );
            }
        }
        watch_app.dependencies.push(Dependency::Target {
            name: extension_name.clone(),
            embed: true,
        });

        if plan.platform == Platform::Watchos {
            layout.extension_host = Some(extension_name);
            layout.primary_app = Some(watch_dir.clone());
        }
        if let Some(host) = host.and_then(|name| layout.target_mut(name)) {
            host.dependencies.push(Dependency::Target {
                name: watch_dir,
                embed: true,
            });
        }
        layout.targets.push(watch_app);
        layout.targets.push(extension);
    }

    fn add_paired_watch(&self, layout: &mut Layout, plan: &BuildPlan) {
        let host = self.add_app(layout, plan, Platform::Ios);
        if plan.platform == Platform::Watchos {
            // The iOS host is secondary: it keeps the base identifier so the
            // watch chain stays `<app>.watchkitapp`.
            let base = layout.base_bundle_id.clone();
            if let Some(target) = layout.target_mut(&host) {
                target.bundle_id = base;
            }
        }
        self.add_watch_app(layout, plan, Some(&host));
    }

    // ─────────────────────────────────────────────────────────────────────
    // App-wide properties
    // ─────────────────────────────────────────────────────────────────────

    fn apply_app_properties(&self, layout: &mut Layout, plan: &BuildPlan) {
        let localizations: Vec<String> = plan
            .localizations
            .iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();

        for target in layout.targets.iter_mut().filter(|t| t.target_type.is_app()) {
            let filtered = self.matrix.filter_capabilities(target.platform, &plan.rule_keys);
            for key in &filtered.keys {
                if let Some(defaults) = capability_defaults(key, &target.bundle_id) {
                    merge_properties(&mut target.entitlements, &defaults.entitlements);
                    merge_properties(&mut target.info, &defaults.info);
                }
            }

            for permission in &plan.permissions {
                let key = permission.key.trim();
                if key.is_empty() {
                    continue;
                }
                let description = if permission.description.trim().is_empty() {
                    format!("{} uses this to provide its features.", layout.app_name)
                } else {
                    permission.description.trim().to_string()
                };
                target.info.insert(key.to_string(), description.into());
            }

            if !localizations.is_empty() {
                target.info.insert(
                    "CFBundleLocalizations".into(),
                    localizations.clone().into(),
                );
            }
        }
    }

    fn add_extensions(&self, layout: &mut Layout, plan: &BuildPlan) {
        let Some(host_name) = layout.extension_host.clone() else {
            return;
        };
        let Some((host_bundle_id, host_platform)) = layout
            .target_mut(&host_name)
            .map(|host| (host.bundle_id.clone(), host.platform))
        else {
            return;
        };

        let mut used_names: BTreeSet<String> =
            layout.targets.iter().map(|t| t.name.clone()).collect();
        let mut used_ids: BTreeSet<String> =
            layout.targets.iter().map(|t| t.bundle_id.clone()).collect();
        let mut host_info = PropertyMap::new();
        let mut host_entitlements = PropertyMap::new();

        for spec in &plan.extensions {
            let name = unique(&mut used_names, extension_target_name(&layout.app_name, spec));
            let token = match spec.kind() {
                Some(kind) => kind_token(kind).to_string(),
                None => token_or(&[spec.kind.as_str(), name.as_str()], "extension"),
            };
            let bundle_id = unique(&mut used_ids, child(&host_bundle_id, &token));
            let defaults = extension_defaults(spec.kind(), &host_bundle_id, &bundle_id);

            let mut target = self.base_target(layout, name.clone(), host_platform, defaults.target_type);
            target.sources = vec![SourceRoot::required(format!("Targets/{name}"))];
            target.bundle_id = bundle_id;
            target.info = defaults.info;
            target.entitlements = defaults.entitlements;
            merge_properties(&mut target.settings, &map_from_json(&spec.settings));
            merge_properties(&mut target.info, &map_from_json(&spec.info_plist));
            merge_properties(&mut target.entitlements, &map_from_json(&spec.entitlements));
            if host_platform == Platform::Ios {
                apply_device_family(
                    &mut target.settings,
                    device_family_row(plan.effective_device_family()),
                );
            }

            merge_properties(&mut host_info, &defaults.host_info);
            merge_host_entitlements(&mut host_entitlements, &defaults.host_entitlements);
            layout.targets.push(target);

            if let Some(host) = layout.target_mut(&host_name) {
                host.dependencies.push(Dependency::Target { name, embed: true });
            }
        }

        if let Some(host) = layout.target_mut(&host_name) {
            merge_properties(&mut host.info, &host_info);
            merge_host_entitlements(&mut host.entitlements, &host_entitlements);
        }
    }

    fn attach_packages(&self, layout: &mut Layout, plan: &BuildPlan) -> Vec<PackageRef> {
        let mut packages: BTreeMap<String, PackageRef> = BTreeMap::new();
        for package in &plan.packages {
            let name = package.name.trim();
            if name.is_empty() || package.url.trim().is_empty() {
                tracing::warn!(package = name, "Skipping package without name or url");
                continue;
            }
            packages.entry(name.to_string()).or_insert_with(|| PackageRef {
                name: name.to_string(),
                url: package.url.trim().to_string(),
                version: package.version.clone().filter(|v| !v.trim().is_empty()),
            });
            for target in layout
                .targets
                .iter_mut()
                .filter(|t| t.target_type == TargetType::Application)
            {
                for product in package.linked_products() {
                    let dependency = Dependency::Package {
                        package: name.to_string(),
                        product: product.to_string(),
                    };
                    if !target.dependencies.contains(&dependency) {
                        target.dependencies.push(dependency);
                    }
                }
            }
        }
        packages.into_values().collect()
    }

    fn project_options(&self, plan: &BuildPlan, targets: &[Target]) -> ProjectOptions {
        let project = &self.config.project;
        let mut settings = PropertyMap::new();
        settings.insert("SWIFT_VERSION".into(), project.swift_version.as_str().into());
        settings.insert(
            "MARKETING_VERSION".into(),
            project.marketing_version.as_str().into(),
        );
        settings.insert(
            "CURRENT_PROJECT_VERSION".into(),
            project.build_number.as_str().into(),
        );

        let deployment_targets = targets
            .iter()
            .map(|t| (t.platform, t.deployment_target.clone()))
            .collect();

        ProjectOptions {
            bundle_id_prefix: project.bundle_id_prefix.trim_matches('.').to_string(),
            development_language: plan
                .localizations
                .iter()
                .map(|code| code.trim())
                .find(|code| !code.is_empty())
                .map(str::to_string),
            deployment_targets,
            settings,
        }
    }
}

fn apply_device_family(settings: &mut PropertyMap, row: DeviceFamilyRow) {
    settings.insert(
        "TARGETED_DEVICE_FAMILY".into(),
        row.targeted_device_family.into(),
    );
    if row.iphone_orientations {
        settings.insert(ORIENTATIONS_IPHONE_KEY.into(), IPHONE_ORIENTATIONS.into());
    }
    if row.ipad_orientations {
        settings.insert(ORIENTATIONS_IPAD_KEY.into(), IPAD_ORIENTATIONS.into());
    }
}

/// Host entitlements from several extensions accumulate list entries
/// (app groups, associated clips) instead of replacing them.
fn merge_host_entitlements(base: &mut PropertyMap, incoming: &PropertyMap) {
    for (key, value) in incoming {
        match value {
            PropertyValue::List(items) => {
                for item in items.iter().filter_map(PropertyValue::as_str) {
                    append_unique(base, key, item);
                }
            }
            other => {
                base.insert(key.clone(), other.clone());
            }
        }
    }
}

fn extension_target_name(app_name: &str, spec: &ExtensionSpec) -> String {
    if let Some(name) = spec.explicit_name() {
        let cleaned: String = name.chars().filter(char::is_ascii_alphanumeric).collect();
        if !cleaned.is_empty() {
            return cleaned;
        }
    }
    match spec.kind() {
        Some(kind) => format!("{app_name}{}", kind.target_suffix()),
        None => {
            let raw = sanitize_token(&spec.kind);
            if raw.is_empty() {
                format!("{app_name}Extension")
            } else {
                let mut chars = raw.chars();
                let head: String = chars.next().map(|c| c.to_ascii_uppercase()).into_iter().collect();
                format!("{app_name}{head}{}", chars.as_str())
            }
        }
    }
}

/// `candidate`, or `candidate2`, `candidate3`, ... until unused
fn unique(used: &mut BTreeSet<String>, candidate: String) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let next = format!("{candidate}{n}");
        if used.insert(next.clone()) {
            return next;
        }
        n += 1;
    }
}
