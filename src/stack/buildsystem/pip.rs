//! pip build system (Python)

use super::python_common::{python_test_command, venv_artifacts, PYTHON_IGNORE};
use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_pyproject, parse_requirements, ManifestData};
use crate::stack::{BuildSystemId, LanguageId};
use tracing::debug;

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("requirements.txt"),
    ManifestPattern::manifest("pyproject.toml"),
    ManifestPattern::manifest("setup.py"),
];

pub struct PipBuildSystem;

impl PipBuildSystem {
    fn uses_requirements(files: &FileManifest) -> bool {
        files.contains("requirements.txt")
    }

    fn is_poetry_project(files: &FileManifest) -> bool {
        files
            .read("pyproject.toml")
            .is_some_and(|c| c.contains("[tool.poetry"))
    }
}

impl BuildSystem for PipBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Pip
    }

    fn language(&self) -> LanguageId {
        LanguageId::Python
    }

    fn package_manager(&self) -> &'static str {
        "pip"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    /// requirements.txt always counts; a pyproject.toml or setup.py only for
    /// projects no other Python tool claims.
    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        if Self::uses_requirements(files) {
            return Some(vec!["requirements.txt".to_string()]);
        }
        if files.contains("Pipfile") || Self::is_poetry_project(files) {
            return None;
        }
        let matched = super::present_patterns(PATTERNS, files);
        (!matched.is_empty()).then_some(matched)
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        let mut data = files
            .read("pyproject.toml")
            .and_then(|c| {
                parse_pyproject(&c)
                    .map_err(|e| debug!(error = %e, "Ignoring unparsable pyproject.toml"))
                    .ok()
            })
            .unwrap_or_default();
        if let Some(content) = files.read("requirements.txt") {
            data.dependencies
                .extend(parse_requirements(&content).dependencies);
        }
        if let Some(content) = files.read("requirements-dev.txt") {
            data.dev_dependencies
                .extend(parse_requirements(&content).dependencies);
        }
        data
    }

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands {
        let (install, ci_install, needs_source) = if Self::uses_requirements(files) {
            let ci = if files.contains("requirements-dev.txt") {
                Some("pip install -r requirements.txt -r requirements-dev.txt".to_string())
            } else {
                None
            };
            ("pip install --no-cache-dir -r requirements.txt", ci, false)
        } else {
            ("pip install --no-cache-dir .", None, true)
        };

        BuildCommands {
            install: Some(install.to_string()),
            ci_install,
            build: None,
            test: python_test_command(manifest, files, ""),
            prune: None,
            install_needs_source: needs_source,
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
    fn test_requirements_project() {
        let (_t, files) = workspace(&[
            ("requirements.txt", "flask\npytest\n"),
            ("app.py", ""),
        ]);
        assert_eq!(
            PipBuildSystem.detect(&files),
            Some(vec!["requirements.txt".to_string()])
        );
        let manifest = PipBuildSystem.parse_manifest(&files);
        assert!(manifest.has_dependency("flask"));
        let commands = PipBuildSystem.commands(&manifest, &files);
        assert_eq!(
            commands.install.as_deref(),
            Some("pip install --no-cache-dir -r requirements.txt")
        );
        assert!(!commands.install_needs_source);
        assert_eq!(commands.test.as_deref(), Some("python -m pytest"));
    }

    #[test]
    fn test_pyproject_only_installs_from_source() {
        let (_t, files) = workspace(&[("pyproject.toml", "[project]\nname = \"svc\"\n")]);
        assert_eq!(
            PipBuildSystem.detect(&files),
            Some(vec!["pyproject.toml".to_string()])
        );
        let commands = PipBuildSystem.commands(&ManifestData::default(), &files);
        assert_eq!(commands.install.as_deref(), Some("pip install --no-cache-dir ."));
        assert!(commands.install_needs_source);
    }

    #[test]
    fn test_yields_to_poetry() {
        let (_t, files) = workspace(&[("pyproject.toml", "[tool.poetry]\nname = \"svc\"\n")]);
        assert!(PipBuildSystem.detect(&files).is_none());
    }
}
