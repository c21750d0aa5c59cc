//! Language definitions
//!
//! A language knows its source extensions, how to find its runtime version,
//! which base images exist for it and what a conventional entry file looks
//! like. Everything that depends on the package manager lives in
//! [`crate::stack::buildsystem`].

use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{extract_version, truncate_version, ManifestData};
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};
use serde::{Deserialize, Serialize};
use std::fmt;

mod go;
mod java;
mod javascript;
mod php;
mod python;
mod ruby;
mod rust;
mod typescript;

pub use go::GoLanguage;
pub use java::JavaLanguage;
pub use javascript::JavaScriptLanguage;
pub use php::PhpLanguage;
pub use python::PythonLanguage;
pub use ruby::RubyLanguage;
pub use rust::RustLanguage;
pub use typescript::TypeScriptLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// Coarse estimate for image references not listed in the tables
    pub fn estimate(image: &str) -> Self {
        let image = image.to_lowercase();
        if image.contains("distroless") || image.starts_with("scratch") || image.contains("alpine")
        {
            SizeClass::Small
        } else if image.contains("slim") || image.contains("-jre") || image.contains("-cli") {
            SizeClass::Medium
        } else {
            SizeClass::Large
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseImage {
    pub image: String,
    pub size: SizeClass,
}

impl BaseImage {
    pub fn new(image: impl Into<String>, size: SizeClass) -> Self {
        Self {
            image: image.into(),
            size,
        }
    }

    pub fn estimated(image: impl Into<String>) -> Self {
        let image = image.into();
        let size = SizeClass::estimate(&image);
        Self { image, size }
    }
}

/// Base images available for one language at one version
#[derive(Debug, Clone)]
pub struct ImageSet {
    /// Full toolchain image used by build stages
    pub build: BaseImage,
    /// Images able to both build and run the project in one stage
    pub single_stage: Vec<BaseImage>,
    /// Minimal runtime image for multi-stage output
    pub runtime: Option<BaseImage>,
}

/// CI toolchain setup for a language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiSetup {
    /// GitHub Actions setup action
    pub action: &'static str,
    pub with: Vec<(&'static str, String)>,
    /// Container image for GitLab CI jobs
    pub image: String,
}

pub trait LanguageDefinition: Send + Sync {
    fn id(&self) -> LanguageId;

    fn extensions(&self) -> &[&str];

    /// Dedicated version files, checked before manifest constraints
    fn version_files(&self) -> &[&str] {
        &[]
    }

    /// Number of version components used in image tags
    fn version_precision(&self) -> usize {
        3
    }

    /// Tag used when no version could be detected
    fn default_version(&self) -> &'static str;

    fn detect_version(&self, files: &FileManifest, manifest: &ManifestData) -> Option<String> {
        let raw = self
            .version_files()
            .iter()
            .filter_map(|path| files.read(path))
            .find_map(|content| version_from_file(&content))
            .or_else(|| manifest.runtime_version.as_deref().and_then(extract_version))?;
        Some(truncate_version(&raw, self.version_precision()))
    }

    fn images(&self, version: &str, build_system: BuildSystemId) -> ImageSet;

    /// Start commands derived from well-known entry files
    fn conventional_commands(
        &self,
        files: &FileManifest,
        manifest: &ManifestData,
    ) -> Vec<CommandCandidate>;

    /// Regexes whose first capture group is a port bound in source code
    fn port_patterns(&self) -> &[&str] {
        &[]
    }

    /// Environment set in every generated image
    fn image_env(&self) -> &[(&str, &str)] {
        &[]
    }

    fn ci_setup(&self, version: &str, build_system: BuildSystemId) -> CiSetup;
}

/// First version number found in a version file, skipping comments.
/// Understands plain files (`.nvmrc`, `runtime.txt`) and `rust-toolchain.toml`.
pub(crate) fn version_from_file(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('['))
        .map(|line| match line.split_once('=') {
            Some((key, value)) if key.trim() == "channel" => value.trim().trim_matches('"'),
            _ => line,
        })
        .find_map(extract_version)
}

/// Returns the first present file from `candidates` turned into a command
pub(crate) fn first_entry_file(
    files: &FileManifest,
    candidates: &[&str],
    to_command: impl Fn(&str) -> String,
) -> Vec<CommandCandidate> {
    files
        .first_present(candidates)
        .map(|file| vec![CommandCandidate::new(file, to_command(file), file)])
        .unwrap_or_default()
}
