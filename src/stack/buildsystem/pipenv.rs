//! Pipenv build system (Python)

use super::python_common::{python_test_command, venv_artifacts, PYTHON_IGNORE};
use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_pipfile, ManifestData};
use crate::stack::{canonical_key_rank, BuildSystemId, CommandCandidate, LanguageId};
use tracing::debug;

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("Pipfile"),
    ManifestPattern::lockfile("Pipfile.lock"),
];

pub struct PipenvBuildSystem;

impl BuildSystem for PipenvBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Pipenv
    }

    fn language(&self) -> LanguageId {
        LanguageId::Python
    }

    fn package_manager(&self) -> &'static str {
        "pipenv"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .read("Pipfile")
            .and_then(|c| {
                parse_pipfile(&c)
                    .map_err(|e| debug!(error = %e, "Ignoring unparsable Pipfile"))
                    .ok()
            })
            .unwrap_or_default()
    }

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands {
        let lock_flag = if files.contains("Pipfile.lock") {
            "--deploy"
        } else {
            "--skip-lock"
        };
        BuildCommands {
            install: Some(format!(
                "pip install --no-cache-dir pipenv && pipenv install --system {}",
                lock_flag
            )),
            ci_install: Some(format!(
                "pip install pipenv && pipenv install --system --dev {}",
                lock_flag
            )),
            build: None,
            test: python_test_command(manifest, files, ""),
            prune: None,
            install_needs_source: false,
        }
    }

    /// `[scripts]` entries run as-is since dependencies are installed system-wide
    fn declared_commands(
        &self,
        manifest: &ManifestData,
        _files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        manifest
            .scripts
            .iter()
            .filter_map(|(key, command)| {
                let rank = canonical_key_rank(key).filter(|_| key != "web")?;
                Some(CommandCandidate::new(key.as_str(), command.as_str(), "Pipfile").with_rank(rank))
            })
            .collect()
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
    fn test_pipfile_scripts_declare_start() {
        let pipfile = "[packages]\nflask = \"*\"\n\n[scripts]\nstart = \"gunicorn app:app\"\nlint = \"flake8\"\n\n[requires]\npython_version = \"3.11\"\n";
        let (_t, files) = workspace(&[("Pipfile", pipfile)]);

        assert_eq!(PipenvBuildSystem.detect(&files), Some(vec!["Pipfile".to_string()]));
        let manifest = PipenvBuildSystem.parse_manifest(&files);
        let declared = PipenvBuildSystem.declared_commands(&manifest, &files);
        assert_eq!(declared.len(), 1);
        assert_eq!(declared[0].command, "gunicorn app:app");

        let commands = PipenvBuildSystem.commands(&manifest, &files);
        assert_eq!(
            commands.install.as_deref(),
            Some("pip install --no-cache-dir pipenv && pipenv install --system --skip-lock")
        );
    }
}
