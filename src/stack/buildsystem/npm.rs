//! npm build system (JavaScript/TypeScript)

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
    ManifestPattern::lockfile("package-lock.json"),
    ManifestPattern::lockfile("npm-shrinkwrap.json"),
];

pub struct NpmBuildSystem;

impl NpmBuildSystem {
    fn run(script: &str) -> String {
        match script {
            "start" | "test" => format!("npm {}", script),
            _ => format!("npm run {}", script),
        }
    }
}

impl BuildSystem for NpmBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Npm
    }

    fn language(&self) -> LanguageId {
        LanguageId::JavaScript
    }

    fn language_for(&self, files: &FileManifest) -> LanguageId {
        node_language(files)
    }

    fn package_manager(&self) -> &'static str {
        "npm"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    /// An npm lockfile always counts; a bare package.json only when no other
    /// Node package manager claims the project.
    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        if !files.contains("package.json") {
            return None;
        }
        let has_npm_lock =
            files.contains("package-lock.json") || files.contains("npm-shrinkwrap.json");
        let claimed_elsewhere = files.contains("yarn.lock")
            || files.contains("pnpm-lock.yaml")
            || package_manager_is(files, "yarn")
            || package_manager_is(files, "pnpm");

        if has_npm_lock || !claimed_elsewhere {
            Some(super::present_patterns(PATTERNS, files))
        } else {
            None
        }
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        read_package_json(files)
    }

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands {
        let install = if files.contains("package-lock.json") || files.contains("npm-shrinkwrap.json")
        {
            "npm ci"
        } else {
            "npm install"
        };
        node_commands(install, Some("npm prune --omit=dev"), manifest, Self::run)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::buildsystem::test_support::workspace;

    #[test]
    fn test_detect_with_lockfile() {
        let (_t, files) = workspace(&[("package.json", "{}"), ("package-lock.json", "{}")]);
        assert_eq!(
            NpmBuildSystem.detect(&files),
            Some(vec!["package.json".to_string(), "package-lock.json".to_string()])
        );
    }

    #[test]
    fn test_bare_package_json_defaults_to_npm() {
        let (_t, files) = workspace(&[("package.json", "{}")]);
        assert!(NpmBuildSystem.detect(&files).is_some());
    }

    #[test]
    fn test_yields_to_other_package_managers() {
        let (_t, files) = workspace(&[("package.json", "{}"), ("yarn.lock", "")]);
        assert!(NpmBuildSystem.detect(&files).is_none());

        let (_t, files) = workspace(&[("package.json", r#"{"packageManager": "pnpm@9.0.0"}"#)]);
        assert!(NpmBuildSystem.detect(&files).is_none());
    }

    #[test]
    fn test_commands() {
        let (_t, files) = workspace(&[
            ("package.json", r#"{"scripts": {"build": "tsc", "test": "jest", "start": "node dist/index.js"}}"#),
            ("package-lock.json", "{}"),
        ]);
        let manifest = NpmBuildSystem.parse_manifest(&files);
        let commands = NpmBuildSystem.commands(&manifest, &files);
        assert_eq!(commands.install.as_deref(), Some("npm ci"));
        assert_eq!(commands.build.as_deref(), Some("npm run build"));
        assert_eq!(commands.test.as_deref(), Some("npm test"));

        let declared = NpmBuildSystem.declared_commands(&manifest, &files);
        assert_eq!(declared[0].command, "npm start");
        assert!(NpmBuildSystem.stage_artifacts(&commands, "npm start").is_some());
    }
}
