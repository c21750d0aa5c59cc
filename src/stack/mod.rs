//! Read-only signature and template tables for languages, build systems,
//! frameworks and backing services.
//!
//! Identifiers are closed enums (`LanguageId`, `BuildSystemId`, `FrameworkId`);
//! behaviour hangs off the [`LanguageDefinition`], [`BuildSystem`] and
//! [`Framework`] traits. The process-wide [`StackRegistry`] is built once and
//! never mutated, so concurrent analyses share it freely.
//!
//! # Example
//!
//! ```no_run
//! use dockmate::stack::{BuildSystemId, LanguageId, StackRegistry};
//!
//! let registry = StackRegistry::global();
//! let npm = registry.get_build_system(BuildSystemId::Npm).unwrap();
//! assert_eq!(npm.language(), LanguageId::JavaScript);
//! ```

#[macro_use]
pub mod id_enum_macro;

pub mod build_system_id;
pub mod buildsystem;
pub mod framework;
pub mod framework_id;
pub mod language;
pub mod language_id;
pub mod manifest;
pub mod registry;
pub mod services;

pub use build_system_id::BuildSystemId;
pub use buildsystem::{BuildCommands, BuildSystem, ManifestPattern, ManifestRole, StageArtifacts};
pub use framework::{DependencyPattern, Framework};
pub use framework_id::FrameworkId;
pub use language::{BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
pub use language_id::LanguageId;
pub use manifest::ManifestData;
pub use registry::StackRegistry;
pub use services::BackingService;

use serde::{Deserialize, Serialize};

/// A start command offered by a manifest or a convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCandidate {
    /// Script name, binary name or file the command was derived from
    pub key: String,
    pub command: String,
    /// Build command required to produce what `command` runs
    pub build: Option<String>,
    /// File that declared the command
    pub source: String,
    /// Lower ranks win when several candidates exist; `None` is never preferred
    pub canonical_rank: Option<u8>,
}

impl CommandCandidate {
    pub fn new(key: impl Into<String>, command: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            command: command.into(),
            build: None,
            source: source.into(),
            canonical_rank: None,
        }
    }

    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    pub fn with_rank(mut self, rank: u8) -> Self {
        self.canonical_rank = Some(rank);
        self
    }
}

/// Rank of a script key under the canonical start/serve convention
pub fn canonical_key_rank(key: &str) -> Option<u8> {
    match key {
        "start" | "web" => Some(0),
        "serve" => Some(1),
        _ => None,
    }
}
