//! Yarn build system (JavaScript/TypeScript)

use super::node_common::{
    node_commands, node_declared, node_language, node_stage_artifacts, package_manager_is,
    read_package_json, NODE_IGNORE,
};
use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("package.json"),
    ManifestPattern::lockfile("yarn.lock"),
    ManifestPattern::manifest(".yarnrc.yml"),
];

pub struct YarnBuildSystem;

impl YarnBuildSystem {
    fn run(script: &str) -> String {
        format!("yarn {}", script)
    }

    /// Yarn 2+ projects carry `.yarnrc.yml`
    fn is_berry(files: &FileManifest) -> bool {
        files.contains(".yarnrc.yml")
            || read_package_json(files)
                .package_manager
                .is_some_and(|pm| !pm.starts_with("yarn@1"))
    }
}

impl BuildSystem for YarnBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Yarn
    }

    fn language(&self) -> LanguageId {
        LanguageId::JavaScript
    }

    fn language_for(&self, files: &FileManifest) -> LanguageId {
        node_language(files)
    }

    fn package_manager(&self) -> &'static str {
        "yarn"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        let applies = files.contains("package.json")
            && (files.contains("yarn.lock") || package_manager_is(files, "yarn"));
        applies.then(|| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        read_package_json(files)
    }

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands {
        let (install, prune) = if Self::is_berry(files) {
            (
                "corepack enable && yarn install --immutable",
                "yarn workspaces focus --all --production",
            )
        } else {
            (
                "yarn install --frozen-lockfile",
                "yarn install --production --frozen-lockfile",
            )
        };
        node_commands(install, Some(prune), manifest, Self::run)
    }

    fn declared_commands(
        &self,
        manifest: &ManifestData,
        _files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        node_declared(manifest, Self::run)
    }

    fn cache_dirs(&self) -> &[&str] {
        &["node_modules"]
    }

    fn ignore_patterns(&self) -> &[&str] {
        NODE_IGNORE
    }

    fn stage_artifacts(&self, commands: &BuildCommands, _start_command: &str) -> Option<StageArtifacts> {
        node_stage_artifacts(commands)
    }
}
