//! XcodeGen `project.yml` rendering.
//!
//! Targets and schemes are emitted in descriptor order; property trees are
//! key-ordered. The view structs below borrow from the descriptor and exist
//! only to give serde the XcodeGen field names.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::collections::BTreeMap;

use super::model::{Dependency, ProjectDescriptor, SourceRoot, Target};
use super::property::{PropertyMap, PropertyValue};
use crate::error::{ForgeError, Result};

/// Map that serializes entries in insertion order
struct Ordered<T>(Vec<(String, T)>);

impl<T> Ordered<T> {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Serialize> Serialize for Ordered<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectYaml<'a> {
    name: &'a str,
    options: OptionsYaml<'a>,
    settings: SettingsYaml,
    #[serde(skip_serializing_if = "Ordered::is_empty")]
    packages: Ordered<PackageYaml<'a>>,
    targets: Ordered<TargetYaml<'a>>,
    #[serde(skip_serializing_if = "Ordered::is_empty")]
    schemes: Ordered<SchemeYaml<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OptionsYaml<'a> {
    bundle_id_prefix: &'a str,
    deployment_target: BTreeMap<&'static str, &'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    development_language: Option<&'a str>,
    create_intermediate_groups: bool,
}

#[derive(Serialize)]
struct SettingsYaml {
    base: PropertyMap,
}

#[derive(Serialize)]
struct PackageYaml<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetYaml<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    platform: &'static str,
    deployment_target: &'a str,
    sources: Vec<SourceYaml<'a>>,
    settings: SettingsYaml,
    info: PlistYaml<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entitlements: Option<PlistYaml<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<DependencyYaml<'a>>,
}

#[derive(Serialize)]
struct SourceYaml<'a> {
    path: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    optional: bool,
    #[serde(skip_serializing_if = "no_excludes")]
    excludes: &'a [String],
}

fn no_excludes(excludes: &&[String]) -> bool {
    excludes.is_empty()
}

#[derive(Serialize)]
struct PlistYaml<'a> {
    path: String,
    properties: &'a PropertyMap,
}

#[derive(Serialize)]
#[serde(untagged)]
enum DependencyYaml<'a> {
    Target { target: &'a str, embed: bool },
    Package { package: &'a str, product: &'a str },
}

#[derive(Serialize)]
struct SchemeYaml<'a> {
    build: SchemeBuildYaml,
    run: SchemeRunYaml<'a>,
}

#[derive(Serialize)]
struct SchemeBuildYaml {
    targets: Ordered<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemeRunYaml<'a> {
    config: &'static str,
    executable: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_kit_configuration: Option<&'a str>,
}

fn source_yaml(source: &SourceRoot) -> SourceYaml<'_> {
    SourceYaml {
        path: &source.path,
        optional: source.optional,
        excludes: &source.excludes,
    }
}

fn target_yaml(target: &Target) -> TargetYaml<'_> {
    let mut settings = target.settings.clone();
    settings.insert(
        "PRODUCT_BUNDLE_IDENTIFIER".to_string(),
        PropertyValue::String(target.bundle_id.clone()),
    );
    let dir = target.support_dir();

    TargetYaml {
        kind: target.target_type.as_str(),
        platform: target.platform.display_name(),
        deployment_target: &target.deployment_target,
        sources: target.sources.iter().map(source_yaml).collect(),
        settings: SettingsYaml { base: settings },
        info: PlistYaml {
            path: format!("{dir}/Info.plist"),
            properties: &target.info,
        },
        entitlements: (!target.entitlements.is_empty()).then(|| PlistYaml {
            path: format!("{dir}/{}.entitlements", target.name),
            properties: &target.entitlements,
        }),
        dependencies: target
            .dependencies
            .iter()
            .map(|dependency| match dependency {
                Dependency::Target { name, embed } => DependencyYaml::Target {
                    target: name,
                    embed: *embed,
                },
                Dependency::Package { package, product } => DependencyYaml::Package { package, product },
            })
            .collect(),
    }
}

/// Render a descriptor as XcodeGen YAML
pub fn render_yaml(descriptor: &ProjectDescriptor) -> Result<String> {
    let options = &descriptor.options;
    let project = ProjectYaml {
        name: &descriptor.name,
        options: OptionsYaml {
            bundle_id_prefix: &options.bundle_id_prefix,
            deployment_target: options
                .deployment_targets
                .iter()
                .map(|(platform, version)| (platform.display_name(), version.as_str()))
                .collect(),
            development_language: options.development_language.as_deref(),
            create_intermediate_groups: true,
        },
        settings: SettingsYaml {
            base: options.settings.clone(),
        },
        packages: Ordered(
            descriptor
                .packages
                .iter()
                .map(|package| {
                    (
                        package.name.clone(),
                        PackageYaml {
                            url: &package.url,
                            from: package.version.as_deref(),
                        },
                    )
                })
                .collect(),
        ),
        targets: Ordered(
            descriptor
                .targets()
                .iter()
                .map(|target| (target.name.clone(), target_yaml(target)))
                .collect(),
        ),
        schemes: Ordered(
            descriptor
                .schemes()
                .iter()
                .map(|scheme| {
                    (
                        scheme.name.clone(),
                        SchemeYaml {
                            build: SchemeBuildYaml {
                                targets: Ordered(
                                    scheme
                                        .build_targets
                                        .iter()
                                        .map(|name| (name.clone(), "all"))
                                        .collect(),
                                ),
                            },
                            run: SchemeRunYaml {
                                config: "Debug",
                                executable: &scheme.run_target,
                                store_kit_configuration: scheme.storekit_configuration.as_deref(),
                            },
                        },
                    )
                })
                .collect(),
        ),
    };

    serde_yaml::to_string(&project).map_err(|source| ForgeError::YamlSerialize { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::model::{ProjectOptions, Scheme, TargetType};
    use crate::types::Platform;

    fn descriptor() -> ProjectDescriptor {
        let app = Target {
            name: "Notes".into(),
            platform: Platform::Ios,
            target_type: TargetType::Application,
            deployment_target: "17.0".into(),
            sources: vec![SourceRoot::required("Notes")],
            bundle_id: "com.example.notes".into(),
            settings: PropertyMap::new(),
            info: PropertyMap::new(),
            entitlements: PropertyMap::new(),
            dependencies: vec![Dependency::Target {
                name: "NotesWidget".into(),
                embed: true,
            }],
        };
        let widget = Target {
            name: "NotesWidget".into(),
            target_type: TargetType::AppExtension,
            sources: vec![SourceRoot::required("Targets/NotesWidget")],
            bundle_id: "com.example.notes.widget".into(),
            dependencies: Vec::new(),
            ..app.clone()
        };
        let mut options = ProjectOptions {
            bundle_id_prefix: "com.example".into(),
            ..Default::default()
        };
        options
            .deployment_targets
            .insert(Platform::Ios, "17.0".into());
        let mut descriptor =
            ProjectDescriptor::new("Notes", options, vec![app, widget]).expect("valid graph");
        descriptor
            .add_scheme(Scheme {
                name: "Notes".into(),
                build_targets: vec!["NotesWidget".into(), "Notes".into()],
                run_target: "Notes".into(),
                storekit_configuration: None,
            })
            .expect("scheme");
        descriptor
    }

    #[test]
    fn renders_targets_in_descriptor_order() {
        let yaml = render_yaml(&descriptor()).expect("renders");
        let widget = yaml.find("  NotesWidget:\n").expect("widget target");
        let app = yaml.find("  Notes:\n").expect("app target");
        assert!(widget < app, "{yaml}");
        assert!(yaml.contains("type: app-extension"), "{yaml}");
        assert!(yaml.contains("PRODUCT_BUNDLE_IDENTIFIER: com.example.notes.widget"), "{yaml}");
        assert!(yaml.contains("executable: Notes"), "{yaml}");
        assert!(!yaml.contains("entitlements:"), "{yaml}");
    }

    #[test]
    fn parses_back_as_yaml() {
        let yaml = render_yaml(&descriptor()).expect("renders");
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).expect("valid yaml");
        assert_eq!(value["options"]["bundleIdPrefix"].as_str(), Some("com.example"));
        assert_eq!(value["options"]["deploymentTarget"]["iOS"].as_str(), Some("17.0"));
        assert_eq!(
            value["targets"]["Notes"]["dependencies"][0]["target"].as_str(),
            Some("NotesWidget")
        );
        assert_eq!(
            value["schemes"]["Notes"]["build"]["targets"]["NotesWidget"].as_str(),
            Some("all")
        );
    }
}
