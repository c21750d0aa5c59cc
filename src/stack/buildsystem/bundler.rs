//! Bundler build system (Ruby)

use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_gemfile, ManifestData};
use crate::stack::{BuildSystemId, LanguageId};

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("Gemfile"),
    ManifestPattern::lockfile("Gemfile.lock"),
];

pub struct BundlerBuildSystem;

impl BuildSystem for BundlerBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Bundler
    }

    fn language(&self) -> LanguageId {
        LanguageId::Ruby
    }

    fn package_manager(&self) -> &'static str {
        "bundler"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        files
            .contains("Gemfile")
            .then(|| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .read("Gemfile")
            .map(|c| parse_gemfile(&c))
            .unwrap_or_default()
    }

    fn commands(&self, manifest: &ManifestData, files: &FileManifest) -> BuildCommands {
        let test = if manifest.has_any_dependency("rspec") || manifest.has_any_dependency("rspec-rails")
        {
            Some("bundle exec rspec".to_string())
        } else if files.contains("Rakefile") {
            Some("bundle exec rake test".to_string())
        } else {
            None
        };

        BuildCommands {
            install: Some("bundle install --jobs 4".to_string()),
            ci_install: None,
            build: None,
            test,
            prune: None,
            install_needs_source: false,
        }
    }

    fn image_env(&self) -> &[(&str, &str)] {
        &[("BUNDLE_WITHOUT", "development:test")]
    }

    fn ignore_patterns(&self) -> &[&str] {
        &[".bundle", "vendor/bundle", "log", "tmp"]
    }

    fn stage_artifacts(&self, _commands: &BuildCommands, _start_command: &str) -> Option<StageArtifacts> {
        None
    }
}
