//! JavaScript language definition (npm, yarn, pnpm)

use super::{first_entry_file, BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

const ENTRY_FILES: &[&str] = &[
    "server.js",
    "app.js",
    "index.js",
    "main.js",
    "src/server.js",
    "src/app.js",
    "src/index.js",
    "src/main.js",
];

pub(super) const NODE_PORT_PATTERNS: &[&str] = &[
    r"\.listen\(\s*(\d{2,5})",
    r"PORT\s*(?:\|\||\?\?)\s*(\d{2,5})",
    r"port\s*:\s*(\d{2,5})",
];

pub(super) fn node_images(version: &str) -> ImageSet {
    ImageSet {
        build: BaseImage::new(format!("node:{}", version), SizeClass::Large),
        single_stage: vec![
            BaseImage::new(format!("node:{}-slim", version), SizeClass::Medium),
            BaseImage::new(format!("node:{}-alpine", version), SizeClass::Small),
        ],
        runtime: Some(BaseImage::new(
            format!("node:{}-alpine", version),
            SizeClass::Small,
        )),
    }
}

pub(super) fn node_ci_setup(version: &str, build_system: BuildSystemId) -> CiSetup {
    let mut with = vec![("node-version", version.to_string())];
    // setup-node can only cache pnpm once pnpm itself is installed
    match build_system {
        BuildSystemId::Npm => with.push(("cache", "npm".to_string())),
        BuildSystemId::Yarn => with.push(("cache", "yarn".to_string())),
        _ => {}
    }
    CiSetup {
        action: "actions/setup-node@v4",
        with,
        image: format!("node:{}", version),
    }
}

pub struct JavaScriptLanguage;

impl LanguageDefinition for JavaScriptLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::JavaScript
    }

    fn extensions(&self) -> &[&str] {
        &["js", "jsx", "mjs", "cjs"]
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
        manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        if let Some(main) = manifest.main.as_deref().map(|m| m.trim_start_matches("./")) {
            if files.contains(main) {
                return vec![CommandCandidate::new(main, format!("node {}", main), "package.json")];
            }
        }
        first_entry_file(files, ENTRY_FILES, |file| format!("node {}", file))
    }

    fn port_patterns(&self) -> &[&str] {
        NODE_PORT_PATTERNS
    }

    fn ci_setup(&self, version: &str, build_system: BuildSystemId) -> CiSetup {
        node_ci_setup(version, build_system)
    }
}
