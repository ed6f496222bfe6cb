//! Writing compiled projects to disk.
//!
//! Artifacts are written with the temp-file + fsync + rename pattern so an
//! interrupted run never leaves a truncated `project.yml` behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::model::ProjectDescriptor;
use super::render::render_yaml;
use super::storekit::render_storekit;
use crate::completion::{PLACEHOLDER_SOURCE, resolve_candidates};
use crate::error::{ForgeError, Result};
use crate::plan::BuildPlan;

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| ForgeError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `target` atomically, creating parent directories.
pub fn write_atomic(target: &Path, contents: &str) -> Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    create_dir(parent)?;

    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let temp_path = parent.join(format!(".{file_name}.tmp"));
    let write_err = |source| ForgeError::FileWrite {
        path: temp_path.clone(),
        source,
    };

    let mut file = std::fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    std::fs::rename(&temp_path, target).map_err(|source| ForgeError::FileWrite {
        path: target.to_path_buf(),
        source,
    })
}

/// Write the descriptor (and its StoreKit configuration, when the scheme
/// references one) under `project_dir`. Returns the written paths.
pub fn write_project(
    project_dir: &Path,
    descriptor_file: &str,
    descriptor: &ProjectDescriptor,
    plan: &BuildPlan,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let descriptor_path = project_dir.join(descriptor_file);
    write_atomic(&descriptor_path, &render_yaml(descriptor)?)?;
    tracing::info!(path = %descriptor_path.display(), "Wrote project descriptor");
    written.push(descriptor_path);

    let storekit_path = descriptor
        .schemes()
        .iter()
        .find_map(|scheme| scheme.storekit_configuration.as_deref());
    if let (Some(relative), Some(monetization)) = (storekit_path, plan.monetization.as_ref()) {
        let path = project_dir.join(relative);
        write_atomic(&path, &render_storekit(&descriptor.name, monetization)?)?;
        tracing::info!(path = %path.display(), "Wrote StoreKit configuration");
        written.push(path);
    }

    Ok(written)
}

/// Create every required source directory and a placeholder for each
/// planned file that does not exist yet. Existing files are never touched.
///
/// Returns the placeholder files created.
pub fn scaffold_sources(
    project_dir: &Path,
    descriptor: &ProjectDescriptor,
    plan: &BuildPlan,
) -> Result<Vec<PathBuf>> {
    for target in descriptor.targets() {
        for source in target.sources.iter().filter(|source| !source.optional) {
            create_dir(&project_dir.join(&source.path))?;
        }
    }

    let source_dirs: Vec<&str> = descriptor
        .targets()
        .iter()
        .flat_map(|target| target.sources.iter().map(|source| source.path.as_str()))
        .collect();

    let mut created = Vec::new();
    for file in &plan.files {
        let relative = file.path.trim().trim_start_matches('/');
        if relative.is_empty() {
            continue;
        }
        let candidates = resolve_candidates(project_dir, &descriptor.name, plan, relative);
        if candidates.iter().any(|candidate| candidate.exists()) {
            continue;
        }
        // Paths that already start with a source directory are used as-is;
        // anything else belongs to the primary platform's directory.
        let prefixed = source_dirs
            .iter()
            .any(|dir| Path::new(relative).starts_with(dir));
        let Some(target) = (if prefixed {
            candidates.first()
        } else {
            candidates.get(1).or_else(|| candidates.first())
        }) else {
            continue;
        };
        write_atomic(target, PLACEHOLDER_SOURCE)?;
        created.push(target.clone());
    }

    tracing::debug!(placeholders = created.len(), "scaffolded sources");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityMatrix;
    use crate::config::ForgeConfig;
    use crate::descriptor::DescriptorCompiler;
    use crate::plan::{FileSpec, MonetizationPlan, ProductSpec};

    fn compile(plan: &BuildPlan) -> ProjectDescriptor {
        let config = ForgeConfig::default();
        let matrix = CapabilityMatrix::builtin();
        DescriptorCompiler::new(&config, &matrix)
            .compile("Tally", plan)
            .expect("compiles")
    }

    #[test]
    fn writes_descriptor_and_storekit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plan = BuildPlan {
            monetization: Some(MonetizationPlan {
                products: vec![ProductSpec {
                    id: "tally.pro".into(),
                    kind: "non_consumable".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            ..Default::default()
        };
        let descriptor = compile(&plan);
        let written =
            write_project(dir.path(), "project.yml", &descriptor, &plan).expect("writes");
        assert_eq!(written.len(), 2);
        assert!(dir.path().join("project.yml").is_file());
        assert!(dir.path().join("Tally/Configuration.storekit").is_file());
        assert!(!dir.path().join(".project.yml.tmp").exists());
    }

    #[test]
    fn scaffolds_missing_files_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plan = BuildPlan {
            files: vec![
                FileSpec {
                    path: "Views/HomeView.swift".into(),
                    ..Default::default()
                },
                FileSpec {
                    path: "Tally/App.swift".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let descriptor = compile(&plan);
        std::fs::create_dir_all(dir.path().join("Tally")).expect("mkdir");
        std::fs::write(dir.path().join("Tally/App.swift"), "struct App {}").expect("write");

        let created = scaffold_sources(dir.path(), &descriptor, &plan).expect("scaffolds");
        assert_eq!(created, vec![dir.path().join("Tally/Views/HomeView.swift")]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Tally/App.swift")).expect("read"),
            "struct App {}"
        );
    }
}
