//! Go modules build system

use super::{binary_artifacts, BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_go_mod, ManifestData};
use crate::stack::{BuildSystemId, LanguageId};

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("go.mod"),
    ManifestPattern::lockfile("go.sum"),
];

pub struct GoModBuildSystem;

impl BuildSystem for GoModBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::GoMod
    }

    fn language(&self) -> LanguageId {
        LanguageId::Go
    }

    fn package_manager(&self) -> &'static str {
        "go"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        files
            .contains("go.mod")
            .then(|| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .read("go.mod")
            .map(|c| parse_go_mod(&c))
            .unwrap_or_default()
    }

    fn commands(&self, _manifest: &ManifestData, _files: &FileManifest) -> BuildCommands {
        BuildCommands {
            install: Some("go mod download".to_string()),
            ci_install: None,
            build: Some("CGO_ENABLED=0 go build ./...".to_string()),
            test: Some("go test ./...".to_string()),
            prune: None,
            install_needs_source: false,
        }
    }

    fn ignore_patterns(&self) -> &[&str] {
        &["bin", "*.test", "coverage.out"]
    }

    fn stage_artifacts(&self, _commands: &BuildCommands, start_command: &str) -> Option<StageArtifacts> {
        binary_artifacts(start_command)
    }
}
