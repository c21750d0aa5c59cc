//! Rust language definition (Cargo)

use super::{BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

pub struct RustLanguage;

impl LanguageDefinition for RustLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Rust
    }

    fn extensions(&self) -> &[&str] {
        &["rs"]
    }

    fn version_files(&self) -> &[&str] {
        &["rust-toolchain.toml", "rust-toolchain"]
    }

    fn default_version(&self) -> &'static str {
        "1.79"
    }

    fn images(&self, version: &str, _build_system: BuildSystemId) -> ImageSet {
        ImageSet {
            build: BaseImage::new(format!("rust:{}", version), SizeClass::Large),
            single_stage: vec![BaseImage::new(
                format!("rust:{}-slim", version),
                SizeClass::Large,
            )],
            runtime: Some(BaseImage::new("debian:bookworm-slim", SizeClass::Small)),
        }
    }

    // Cargo declares every binary target, implicit ones included
    fn conventional_commands(
        &self,
        _files: &FileManifest,
        _manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        Vec::new()
    }

    fn port_patterns(&self) -> &[&str] {
        &[
            r#""(?:0\.0\.0\.0|127\.0\.0\.1|localhost|\[::\]):(\d{2,5})""#,
            r"SocketAddr::from\(\(\[[^\]]*\],\s*(\d{2,5})\)\)",
            r#"bind\(\(\s*"[^"]*",\s*(\d{2,5})\s*\)\)"#,
        ]
    }

    fn ci_setup(&self, version: &str, _build_system: BuildSystemId) -> CiSetup {
        CiSetup {
            action: "dtolnay/rust-toolchain@master",
            with: vec![("toolchain", version.to_string())],
            image: format!("rust:{}", version),
        }
    }
}
