//! Build system definitions
//!
//! A build system owns the dependency manifest: it decides whether it applies
//! to a workspace, parses the manifest, and knows the install/build/test
//! commands plus the layout of a multi-stage image. Package manager and build
//! tool coincide for every supported ecosystem.

use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};
use serde::{Deserialize, Serialize};

mod node_common;
mod python_common;

pub mod bundler;
pub mod cargo;
pub mod composer;
pub mod go_mod;
pub mod gradle;
pub mod maven;
pub mod npm;
pub mod pip;
pub mod pipenv;
pub mod pnpm;
pub mod poetry;
pub mod yarn;

pub use bundler::BundlerBuildSystem;
pub use cargo::CargoBuildSystem;
pub use composer::ComposerBuildSystem;
pub use go_mod::GoModBuildSystem;
pub use gradle::GradleBuildSystem;
pub use maven::MavenBuildSystem;
pub use npm::NpmBuildSystem;
pub use pip::PipBuildSystem;
pub use pipenv::PipenvBuildSystem;
pub use pnpm::PnpmBuildSystem;
pub use poetry::PoetryBuildSystem;
pub use yarn::YarnBuildSystem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestRole {
    Manifest,
    Lockfile,
}

/// Manifest pattern for build system detection
#[derive(Debug, Clone, Copy)]
pub struct ManifestPattern {
    pub filename: &'static str,
    pub role: ManifestRole,
}

impl ManifestPattern {
    pub const fn manifest(filename: &'static str) -> Self {
        Self {
            filename,
            role: ManifestRole::Manifest,
        }
    }

    pub const fn lockfile(filename: &'static str) -> Self {
        Self {
            filename,
            role: ManifestRole::Lockfile,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCommands {
    /// Dependency install inside the image
    pub install: Option<String>,
    /// Install used by CI when it needs development dependencies
    pub ci_install: Option<String>,
    pub build: Option<String>,
    pub test: Option<String>,
    /// Drops development dependencies before the runtime stage copies them
    pub prune: Option<String>,
    /// The install step needs the full source tree
    pub install_needs_source: bool,
}

impl BuildCommands {
    pub fn ci_install(&self) -> Option<&str> {
        self.ci_install.as_deref().or(self.install.as_deref())
    }
}

/// What a multi-stage image carries from the build stage into the runtime stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageArtifacts {
    /// Commands run in the build stage before installing
    pub prepare: Vec<String>,
    /// Environment set in both stages
    pub env: Vec<(String, String)>,
    /// Environment set only in the runtime stage
    pub runtime_env: Vec<(String, String)>,
    /// `(source in build stage, destination in runtime stage)`
    pub from_build: Vec<(String, String)>,
    /// Copy the build context into the runtime stage
    pub copy_sources: bool,
}

/// Build system trait
pub trait BuildSystem: Send + Sync {
    fn id(&self) -> BuildSystemId;

    /// Ecosystem language
    fn language(&self) -> LanguageId;

    /// Language refined from the file tree
    fn language_for(&self, _files: &FileManifest) -> LanguageId {
        self.language()
    }

    /// Package manager name shown in profiles
    fn package_manager(&self) -> &'static str;

    fn manifest_patterns(&self) -> &[ManifestPattern];

    /// Returns the manifest/lockfile paths that matched, or `None` when the
    /// build system does not apply
    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        let matched = present_patterns(self.manifest_patterns(), files);
        if matched.is_empty() {
            None
        } else {
            Some(matched)
        }
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData;

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands;

    /// Files copied ahead of the sources so the install layer is cached
    fn dependency_files(&self, files: &FileManifest) -> Vec<String> {
        present_patterns(self.manifest_patterns(), files)
    }

    /// Start commands declared by the manifest
    fn declared_commands(
        &self,
        _manifest: &ManifestData,
        _files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        Vec::new()
    }

    /// Commands that bootstrap the tool itself before installing
    fn setup_commands(&self) -> &[&str] {
        &[]
    }

    /// Tool binary copied out of another image, `(image, path)`
    fn tool_image(&self) -> Option<(&'static str, &'static str)> {
        None
    }

    /// Environment set in every generated image
    fn image_env(&self) -> &[(&str, &str)] {
        &[]
    }

    /// Project-local dependency directories handed between CI jobs
    fn cache_dirs(&self) -> &[&str] {
        &[]
    }

    /// Paths that never belong in the build context
    fn ignore_patterns(&self) -> &[&str] {
        &[]
    }

    /// Multi-stage layout, `None` when the output cannot be split from the toolchain
    fn stage_artifacts(&self, commands: &BuildCommands, start_command: &str)
        -> Option<StageArtifacts>;
}

pub(crate) fn present_patterns(patterns: &[ManifestPattern], files: &FileManifest) -> Vec<String> {
    patterns
        .iter()
        .filter(|p| files.contains(p.filename))
        .map(|p| p.filename.to_string())
        .collect()
}

/// Layout for compiled binaries started as `./path/to/binary`
pub(crate) fn binary_artifacts(start_command: &str) -> Option<StageArtifacts> {
    let binary = start_command.split_whitespace().next()?.strip_prefix("./")?;
    let path = format!("/app/{}", binary);
    Some(StageArtifacts {
        from_build: vec![(path.clone(), path)],
        ..Default::default()
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_artifacts() {
        let artifacts = binary_artifacts("./bin/api --verbose").unwrap();
        assert_eq!(
            artifacts.from_build,
            vec![("/app/bin/api".to_string(), "/app/bin/api".to_string())]
        );
        assert!(!artifacts.copy_sources);
        assert!(binary_artifacts("java -jar app.jar").is_none());
    }

    #[test]
    fn test_ci_install_falls_back_to_install() {
        let commands = BuildCommands {
            install: Some("npm ci".to_string()),
            ..Default::default()
        };
        assert_eq!(commands.ci_install(), Some("npm ci"));
    }
}
