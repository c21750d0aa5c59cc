//! Composer build system (PHP)

use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_composer_json, ManifestData};
use crate::stack::{canonical_key_rank, BuildSystemId, CommandCandidate, LanguageId};
use tracing::debug;

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("composer.json"),
    ManifestPattern::lockfile("composer.lock"),
];

pub struct ComposerBuildSystem;

impl BuildSystem for ComposerBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Composer
    }

    fn language(&self) -> LanguageId {
        LanguageId::Php
    }

    fn package_manager(&self) -> &'static str {
        "composer"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        files
            .contains("composer.json")
            .then(|| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .read("composer.json")
            .and_then(|c| {
                parse_composer_json(&c)
                    .map_err(|e| debug!(error = %e, "Ignoring unparsable composer.json"))
                    .ok()
            })
            .unwrap_or_default()
    }

    fn commands(&self, manifest: &ManifestData, _files: &FileManifest) -> BuildCommands {
        let test = if manifest.script("test").is_some() {
            Some("composer test".to_string())
        } else if manifest.has_any_dependency("phpunit/phpunit") {
            Some("vendor/bin/phpunit".to_string())
        } else {
            None
        };

        BuildCommands {
            install: Some(
                "composer install --no-dev --no-interaction --no-scripts --no-autoloader --prefer-dist"
                    .to_string(),
            ),
            ci_install: Some("composer install --no-interaction --prefer-dist".to_string()),
            build: Some("composer dump-autoload --optimize --no-dev".to_string()),
            test,
            prune: None,
            install_needs_source: false,
        }
    }

    fn declared_commands(
        &self,
        manifest: &ManifestData,
        _files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        manifest
            .scripts
            .keys()
            .filter_map(|key| {
                let rank = canonical_key_rank(key).filter(|_| key != "web")?;
                Some(
                    CommandCandidate::new(
                        key.as_str(),
                        format!("composer run-script {}", key),
                        "composer.json",
                    )
                    .with_rank(rank),
                )
            })
            .collect()
    }

    fn setup_commands(&self) -> &[&str] {
        &["apt-get update && apt-get install -y --no-install-recommends git unzip && rm -rf /var/lib/apt/lists/*"]
    }

    fn tool_image(&self) -> Option<(&'static str, &'static str)> {
        Some(("composer:2", "/usr/bin/composer"))
    }

    fn cache_dirs(&self) -> &[&str] {
        &["vendor"]
    }

    fn ignore_patterns(&self) -> &[&str] {
        &["vendor", ".phpunit.result.cache"]
    }

    fn stage_artifacts(&self, _commands: &BuildCommands, _start_command: &str) -> Option<StageArtifacts> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::buildsystem::test_support::workspace;

    #[test]
    fn test_commands_and_declared_scripts() {
        let (_t, files) = workspace(&[(
            "composer.json",
            r#"{"require": {"php": "^8.2", "slim/slim": "^4"}, "require-dev": {"phpunit/phpunit": "^10"}, "scripts": {"start": "php -S 0.0.0.0:8080 -t public"}}"#,
        )]);
        let manifest = ComposerBuildSystem.parse_manifest(&files);
        let commands = ComposerBuildSystem.commands(&manifest, &files);
        assert_eq!(commands.test.as_deref(), Some("vendor/bin/phpunit"));
        assert_eq!(
            commands.ci_install(),
            Some("composer install --no-interaction --prefer-dist")
        );

        let declared = ComposerBuildSystem.declared_commands(&manifest, &files);
        assert_eq!(declared.len(), 1);
        assert_eq!(declared[0].command, "composer run-script start");
    }
}
