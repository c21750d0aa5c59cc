//! Poetry build system (Python)

use super::python_common::{python_test_command, venv_artifacts, PYTHON_IGNORE};
use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_pyproject, ManifestData};
use crate::stack::{BuildSystemId, LanguageId};
use tracing::debug;

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("pyproject.toml"),
    ManifestPattern::lockfile("poetry.lock"),
];

pub struct PoetryBuildSystem;

impl BuildSystem for PoetryBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Poetry
    }

    fn language(&self) -> LanguageId {
        LanguageId::Python
    }

    fn package_manager(&self) -> &'static str {
        "poetry"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        let poetry_section = files
            .read("pyproject.toml")
            .is_some_and(|c| c.contains("[tool.poetry"));
        (poetry_section || files.contains("poetry.lock"))
            .then(|| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .read("pyproject.toml")
            .and_then(|c| {
                parse_pyproject(&c)
                    .map_err(|e| debug!(error = %e, "Ignoring unparsable pyproject.toml"))
                    .ok()
            })
            .unwrap_or_default()
    }

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands {
        BuildCommands {
            install: Some(
                "pip install --no-cache-dir poetry && poetry config virtualenvs.create false && poetry install --no-root --only main --no-interaction"
                    .to_string(),
            ),
            ci_install: Some("pip install poetry && poetry install --no-interaction".to_string()),
            build: None,
            test: python_test_command(manifest, files, "poetry run"),
            prune: None,
            install_needs_source: false,
        }
    }

    fn ignore_patterns(&self) -> &[&str] {
        PYTHON_IGNORE
    }

    fn stage_artifacts(&self, _commands: &BuildCommands, _start_command: &str) -> Option<StageArtifacts> {
        Some(venv_artifacts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::buildsystem::test_support::workspace;

    #[test]
    fn test_detect_and_commands() {
        let content = "[tool.poetry]\nname = \"svc\"\n\n[tool.poetry.dependencies]\npython = \"^3.11\"\nfastapi = \"*\"\n\n[tool.poetry.group.dev.dependencies]\npytest = \"*\"\n";
        let (_t, files) = workspace(&[("pyproject.toml", content), ("poetry.lock", "")]);

        assert_eq!(
            PoetryBuildSystem.detect(&files),
            Some(vec!["pyproject.toml".to_string(), "poetry.lock".to_string()])
        );
        let manifest = PoetryBuildSystem.parse_manifest(&files);
        assert!(manifest.has_dependency("fastapi"));
        let commands = PoetryBuildSystem.commands(&manifest, &files);
        assert_eq!(commands.test.as_deref(), Some("poetry run python -m pytest"));
        assert_eq!(
            commands.ci_install(),
            Some("pip install poetry && poetry install --no-interaction")
        );
    }

    #[test]
    fn test_plain_pyproject_is_not_poetry() {
        let (_t, files) = workspace(&[("pyproject.toml", "[project]\nname = \"svc\"\n")]);
        assert!(PoetryBuildSystem.detect(&files).is_none());
    }
}
