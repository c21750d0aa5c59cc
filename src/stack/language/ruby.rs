//! Ruby language definition (Bundler)

use super::{first_entry_file, BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

pub struct RubyLanguage;

impl LanguageDefinition for RubyLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Ruby
    }

    fn extensions(&self) -> &[&str] {
        &["rb"]
    }

    fn version_files(&self) -> &[&str] {
        &[".ruby-version"]
    }

    fn default_version(&self) -> &'static str {
        "3.3"
    }

    fn images(&self, version: &str, _build_system: BuildSystemId) -> ImageSet {
        ImageSet {
            build: BaseImage::new(format!("ruby:{}", version), SizeClass::Large),
            single_stage: vec![
                BaseImage::new(format!("ruby:{}-slim", version), SizeClass::Medium),
                BaseImage::new(format!("ruby:{}", version), SizeClass::Large),
            ],
            runtime: None,
        }
    }

    fn conventional_commands(
        &self,
        files: &FileManifest,
        _manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        first_entry_file(files, &["config.ru", "app.rb", "main.rb"], |file| {
            if file == "config.ru" {
                "bundle exec rackup --host 0.0.0.0 --port 9292".to_string()
            } else {
                format!("bundle exec ruby {}", file)
            }
        })
    }

    fn port_patterns(&self) -> &[&str] {
        &[r"set\s+:port,\s*(\d{2,5})", r"port:\s*(\d{2,5})"]
    }

    fn ci_setup(&self, version: &str, _build_system: BuildSystemId) -> CiSetup {
        CiSetup {
            action: "ruby/setup-ruby@v1",
            with: vec![
                ("ruby-version", version.to_string()),
                ("bundler-cache", "true".to_string()),
            ],
            image: format!("ruby:{}", version),
        }
    }
}
