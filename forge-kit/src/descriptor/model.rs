//! Project descriptor model and target-graph invariants.

use std::collections::{BTreeMap, BTreeSet};

use super::property::PropertyMap;
use crate::error::{ForgeError, Result};
use crate::types::Platform;

/// Product type of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Application,
    WatchApp,
    WatchExtension,
    AppExtension,
    AppClip,
}

impl TargetType {
    /// XcodeGen product type literal
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Application => "application",
            TargetType::WatchApp => "application.watchapp2",
            TargetType::WatchExtension => "watchkit2-extension",
            TargetType::AppExtension => "app-extension",
            TargetType::AppClip => "application.on-demand-install-capable",
        }
    }

    /// Targets that behave as a user-facing app (permissions, capabilities)
    pub fn is_app(&self) -> bool {
        matches!(self, TargetType::Application | TargetType::WatchApp)
    }
}

/// A source directory of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub path: String,
    pub optional: bool,
    pub excludes: Vec<String>,
}

impl SourceRoot {
    pub fn required(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            optional: false,
            excludes: Vec::new(),
        }
    }

    pub fn optional(path: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(path)
        }
    }
}

/// Outgoing edge of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// Another target of the project; `embed` copies its product into this one
    Target { name: String, embed: bool },
    /// A product of a Swift package declared in the project
    Package { package: String, product: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub platform: Platform,
    pub target_type: TargetType,
    pub deployment_target: String,
    pub sources: Vec<SourceRoot>,
    pub bundle_id: String,
    pub settings: PropertyMap,
    pub info: PropertyMap,
    pub entitlements: PropertyMap,
    pub dependencies: Vec<Dependency>,
}

impl Target {
    /// Names of targets this target depends on, in edge order
    pub fn target_edges(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().filter_map(|dep| match dep {
            Dependency::Target { name, .. } => Some(name.as_str()),
            Dependency::Package { .. } => None,
        })
    }

    /// Directory holding this target's generated Info.plist and entitlements
    pub fn support_dir(&self) -> &str {
        self.sources
            .iter()
            .find(|source| !source.optional)
            .or_else(|| self.sources.first())
            .map(|source| source.path.as_str())
            .unwrap_or(self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: String,
    pub url: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    pub name: String,
    pub build_targets: Vec<String>,
    pub run_target: String,
    pub storekit_configuration: Option<String>,
}

/// Project-wide options
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectOptions {
    pub bundle_id_prefix: String,
    pub development_language: Option<String>,
    /// Minimum OS per platform used in the project
    pub deployment_targets: BTreeMap<Platform, String>,
    /// Base build settings shared by every target
    pub settings: PropertyMap,
}

/// A validated, ordered set of targets.
///
/// Construction rejects duplicate names, dangling edges and cycles, and
/// orders targets so that every embedded target precedes its embedder.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDescriptor {
    pub name: String,
    pub options: ProjectOptions,
    targets: Vec<Target>,
    schemes: Vec<Scheme>,
    pub packages: Vec<PackageRef>,
}

impl ProjectDescriptor {
    pub fn new(name: impl Into<String>, options: ProjectOptions, targets: Vec<Target>) -> Result<Self> {
        let targets = order_targets(targets)?;
        Ok(Self {
            name: name.into(),
            options,
            targets,
            schemes: Vec::new(),
            packages: Vec::new(),
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|target| target.name == name)
    }

    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    /// Add a scheme; every target it names must exist
    pub fn add_scheme(&mut self, scheme: Scheme) -> Result<()> {
        let unknown: Vec<&str> = scheme
            .build_targets
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(scheme.run_target.as_str()))
            .filter(|name| self.target(name).is_none())
            .collect();
        if !unknown.is_empty() {
            return Err(ForgeError::DescriptorGraph(format!(
                "scheme '{}' references unknown target(s): {}",
                scheme.name,
                unknown.join(", ")
            )));
        }
        self.schemes.push(scheme);
        Ok(())
    }
}

/// Stable topological order: repeatedly take the earliest target whose
/// dependencies have all been placed.
fn order_targets(targets: Vec<Target>) -> Result<Vec<Target>> {
    let mut names = BTreeSet::new();
    for target in &targets {
        if !names.insert(target.name.as_str()) {
            return Err(ForgeError::DescriptorGraph(format!(
                "duplicate target name '{}'",
                target.name
            )));
        }
    }

    for target in &targets {
        for edge in target.target_edges() {
            if edge == target.name {
                return Err(ForgeError::DescriptorGraph(format!(
                    "target '{edge}' depends on itself"
                )));
            }
            if !names.contains(edge) {
                return Err(ForgeError::DescriptorGraph(format!(
                    "target '{}' depends on unknown target '{edge}'",
                    target.name
                )));
            }
        }
    }

    let mut remaining: Vec<Option<Target>> = targets.into_iter().map(Some).collect();
    let mut placed: BTreeSet<String> = BTreeSet::new();
    let mut ordered = Vec::with_capacity(remaining.len());

    while ordered.len() < remaining.len() {
        let next = remaining.iter().position(|slot| {
            slot.as_ref()
                .is_some_and(|target| target.target_edges().all(|edge| placed.contains(edge)))
        });
        let Some(index) = next else {
            let cycle: Vec<&str> = remaining
                .iter()
                .flatten()
                .map(|target| target.name.as_str())
                .collect();
            return Err(ForgeError::DescriptorGraph(format!(
                "embed cycle among targets: {}",
                cycle.join(", ")
            )));
        };
        if let Some(target) = remaining[index].take() {
            placed.insert(target.name.clone());
            ordered.push(target);
        }
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn target(name: &str, deps: &[&str]) -> Target {
        Target {
            name: name.to_string(),
            platform: Platform::Ios,
            target_type: TargetType::Application,
            deployment_target: "17.0".to_string(),
            sources: vec![SourceRoot::required(name)],
            bundle_id: format!("com.example.{}", name.to_lowercase()),
            settings: PropertyMap::new(),
            info: PropertyMap::new(),
            entitlements: PropertyMap::new(),
            dependencies: deps
                .iter()
                .map(|dep| Dependency::Target {
                    name: (*dep).to_string(),
                    embed: true,
                })
                .collect(),
        }
    }

    fn names(descriptor: &ProjectDescriptor) -> Vec<&str> {
        descriptor.targets().iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn embedded_targets_come_first() {
        let descriptor = ProjectDescriptor::new(
            "App",
            ProjectOptions::default(),
            vec![
                target("App", &["AppWatch", "AppWidget"]),
                target("AppWatch", &["AppWatchExtension"]),
                target("AppWatchExtension", &[]),
                target("AppWidget", &[]),
            ],
        )
        .expect("graph is acyclic");
        assert_eq!(
            names(&descriptor),
            vec!["AppWatchExtension", "AppWatch", "AppWidget", "App"]
        );
    }

    #[test]
    fn rejects_cycles() {
        let err = ProjectDescriptor::new(
            "App",
            ProjectOptions::default(),
            vec![target("A", &["B"]), target("B", &["A"])],
        )
        .expect_err("cycle");
        assert!(err.to_string().contains("cycle"), "{err}");
    }

    #[test]
    fn rejects_dangling_and_duplicate() {
        assert!(
            ProjectDescriptor::new("App", ProjectOptions::default(), vec![target("A", &["Z"])])
                .is_err()
        );
        assert!(
            ProjectDescriptor::new(
                "App",
                ProjectOptions::default(),
                vec![target("A", &[]), target("A", &[])]
            )
            .is_err()
        );
    }

    #[test]
    fn scheme_must_name_existing_targets() {
        let mut descriptor =
            ProjectDescriptor::new("App", ProjectOptions::default(), vec![target("App", &[])])
                .expect("valid");
        let err = descriptor
            .add_scheme(Scheme {
                name: "App".into(),
                build_targets: vec!["App".into(), "Ghost".into()],
                run_target: "App".into(),
                storekit_configuration: None,
            })
            .expect_err("unknown target");
        assert!(err.to_string().contains("Ghost"));
    }
}
