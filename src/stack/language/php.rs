//! PHP language definition (Composer)

use super::{first_entry_file, BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

pub struct PhpLanguage;

impl LanguageDefinition for PhpLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Php
    }

    fn extensions(&self) -> &[&str] {
        &["php"]
    }

    fn version_files(&self) -> &[&str] {
        &[".php-version"]
    }

    fn version_precision(&self) -> usize {
        2
    }

    fn default_version(&self) -> &'static str {
        "8.3"
    }

    fn images(&self, version: &str, _build_system: BuildSystemId) -> ImageSet {
        ImageSet {
            build: BaseImage::new(format!("php:{}-cli", version), SizeClass::Medium),
            single_stage: vec![BaseImage::new(
                format!("php:{}-cli", version),
                SizeClass::Medium,
            )],
            runtime: None,
        }
    }

    fn conventional_commands(
        &self,
        files: &FileManifest,
        _manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        first_entry_file(files, &["public/index.php", "index.php"], |file| {
            if file == "public/index.php" {
                "php -S 0.0.0.0:8000 -t public".to_string()
            } else {
                "php -S 0.0.0.0:8000".to_string()
            }
        })
    }

    fn ci_setup(&self, version: &str, _build_system: BuildSystemId) -> CiSetup {
        CiSetup {
            action: "shivammathur/setup-php@v2",
            with: vec![("php-version", version.to_string())],
            image: format!("php:{}-cli", version),
        }
    }
}
