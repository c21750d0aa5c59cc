//! Cargo build system (Rust)

use super::{binary_artifacts, BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_cargo_toml, ManifestData};
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};
use std::collections::BTreeSet;
use tracing::debug;

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("Cargo.toml"),
    ManifestPattern::lockfile("Cargo.lock"),
];

pub struct CargoBuildSystem;

impl CargoBuildSystem {
    /// Explicit `[[bin]]` targets plus the ones Cargo infers from the layout
    fn binary_names(manifest: &ManifestData, files: &FileManifest) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = manifest.binaries.iter().cloned().collect();

        if files.contains("src/main.rs") {
            if let Some(name) = &manifest.name {
                names.insert(name.clone());
            }
        }

        for entry in files.files_in_dir("src/bin") {
            let rest = &entry.path["src/bin/".len()..];
            let name = match rest.split_once('/') {
                Some((dir, "main.rs")) => Some(dir),
                None => rest.strip_suffix(".rs"),
                _ => None,
            };
            if let Some(name) = name {
                names.insert(name.to_string());
            }
        }

        names
    }
}

impl BuildSystem for CargoBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Cargo
    }

    fn language(&self) -> LanguageId {
        LanguageId::Rust
    }

    fn package_manager(&self) -> &'static str {
        "cargo"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    /// Virtual workspace manifests without `[package]` do not describe a service
    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        files
            .read("Cargo.toml")
            .is_some_and(|c| c.contains("[package]"))
            .then(|| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .read("Cargo.toml")
            .and_then(|c| {
                parse_cargo_toml(&c)
                    .map_err(|e| debug!(error = %e, "Ignoring unparsable Cargo.toml"))
                    .ok()
            })
            .unwrap_or_default()
    }

    fn commands(&self, _manifest: &ManifestData, _files: &FileManifest) -> BuildCommands {
        // cargo fetch needs the target sources to resolve the manifest
        BuildCommands {
            install: Some("cargo fetch".to_string()),
            ci_install: None,
            build: Some("cargo build --release".to_string()),
            test: Some("cargo test".to_string()),
            prune: None,
            install_needs_source: true,
        }
    }

    fn declared_commands(
        &self,
        manifest: &ManifestData,
        files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        Self::binary_names(manifest, files)
            .into_iter()
            .map(|name| {
                let candidate = CommandCandidate::new(
                    name.as_str(),
                    format!("./target/release/{}", name),
                    "Cargo.toml",
                )
                .with_build(format!("cargo build --release --bin {}", name));
                if manifest.default_binary.as_deref() == Some(name.as_str()) {
                    candidate.with_rank(0)
                } else {
                    candidate
                }
            })
            .collect()
    }

    fn ignore_patterns(&self) -> &[&str] {
        &["target"]
    }

    fn stage_artifacts(&self, _commands: &BuildCommands, start_command: &str) -> Option<StageArtifacts> {
        binary_artifacts(start_command)
    }
}
