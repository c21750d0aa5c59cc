//! pnpm build system (JavaScript/TypeScript)

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
    ManifestPattern::lockfile("pnpm-lock.yaml"),
];

pub struct PnpmBuildSystem;

impl PnpmBuildSystem {
    fn run(script: &str) -> String {
        match script {
            "start" | "test" => format!("pnpm {}", script),
            _ => format!("pnpm run {}", script),
        }
    }
}

impl BuildSystem for PnpmBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Pnpm
    }

    fn language(&self) -> LanguageId {
        LanguageId::JavaScript
    }

    fn language_for(&self, files: &FileManifest) -> LanguageId {
        node_language(files)
    }

    fn package_manager(&self) -> &'static str {
        "pnpm"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        let applies = files.contains("package.json")
            && (files.contains("pnpm-lock.yaml") || package_manager_is(files, "pnpm"));
        applies.then(|| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        read_package_json(files)
    }

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands {
        let install = if files.contains("pnpm-lock.yaml") {
            "pnpm install --frozen-lockfile"
        } else {
            "pnpm install"
        };
        node_commands(install, Some("pnpm prune --prod"), manifest, Self::run)
    }

    fn declared_commands(
        &self,
        manifest: &ManifestData,
        _files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        node_declared(manifest, Self::run)
    }

    fn setup_commands(&self) -> &[&str] {
        &["corepack enable"]
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::buildsystem::test_support::workspace;

    #[test]
    fn test_detect_and_commands() {
        let (_t, files) = workspace(&[
            ("package.json", r#"{"scripts": {"build": "vite build", "start": "vite preview"}}"#),
            ("pnpm-lock.yaml", ""),
        ]);
        assert_eq!(
            PnpmBuildSystem.detect(&files),
            Some(vec!["package.json".to_string(), "pnpm-lock.yaml".to_string()])
        );
        let manifest = PnpmBuildSystem.parse_manifest(&files);
        let commands = PnpmBuildSystem.commands(&manifest, &files);
        assert_eq!(commands.install.as_deref(), Some("pnpm install --frozen-lockfile"));
        assert_eq!(commands.build.as_deref(), Some("pnpm run build"));
        assert_eq!(commands.prune.as_deref(), Some("pnpm prune --prod"));
    }
}
