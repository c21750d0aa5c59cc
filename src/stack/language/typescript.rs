//! TypeScript language definition, sharing Node images with JavaScript

use super::javascript::{node_ci_setup, node_images, NODE_PORT_PATTERNS};
use super::{first_entry_file, CiSetup, ImageSet, LanguageDefinition};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

const ENTRY_FILES: &[&str] = &[
    "src/index.ts",
    "src/main.ts",
    "src/server.ts",
    "src/app.ts",
    "index.ts",
    "main.ts",
    "server.ts",
];

pub struct TypeScriptLanguage;

impl LanguageDefinition for TypeScriptLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::TypeScript
    }

    fn extensions(&self) -> &[&str] {
        &["ts", "tsx", "mts", "cts"]
    }

    fn version_files(&self) -> &[&str] {
        &[".nvmrc", ".node-version"]
    }

    fn default_version(&self) -> &'static str {
        "20"
    }

    fn images(&self, version: &str, _build_system: BuildSystemId) -> ImageSet {
        node_images(version)
    }

    fn conventional_commands(
        &self,
        files: &FileManifest,
        _manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        first_entry_file(files, ENTRY_FILES, |file| format!("npx tsx {}", file))
    }

    fn port_patterns(&self) -> &[&str] {
        NODE_PORT_PATTERNS
    }

    fn ci_setup(&self, version: &str, build_system: BuildSystemId) -> CiSetup {
        node_ci_setup(version, build_system)
    }
}
