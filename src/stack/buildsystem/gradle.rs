//! Gradle build system (Java/Kotlin)

use super::maven::APP_JAR;
use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_gradle, ManifestData};
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

const PATTERNS: &[ManifestPattern] = &[
    ManifestPattern::manifest("build.gradle"),
    ManifestPattern::manifest("build.gradle.kts"),
    ManifestPattern::manifest("settings.gradle"),
    ManifestPattern::manifest("settings.gradle.kts"),
    ManifestPattern::manifest("gradle.properties"),
    ManifestPattern::lockfile("gradle.lockfile"),
];

const BUILD_SCRIPTS: &[&str] = &["build.gradle", "build.gradle.kts"];

pub struct GradleBuildSystem;

impl BuildSystem for GradleBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Gradle
    }

    fn language(&self) -> LanguageId {
        LanguageId::Java
    }

    fn package_manager(&self) -> &'static str {
        "gradle"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn detect(&self, files: &FileManifest) -> Option<Vec<String>> {
        files
            .first_present(BUILD_SCRIPTS)
            .map(|_| super::present_patterns(PATTERNS, files))
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .first_present(BUILD_SCRIPTS)
            .and_then(|path| files.read(path))
            .map(|c| parse_gradle(&c))
            .unwrap_or_default()
    }

    fn commands(&self, _manifest: &ManifestData, _files: &FileManifest) -> BuildCommands {
        BuildCommands {
            install: Some("gradle dependencies --no-daemon".to_string()),
            ci_install: None,
            build: Some(format!(
                "gradle build -x test --no-daemon && cp \"$(ls build/libs/*.jar | grep -v plain | head -n 1)\" {}",
                APP_JAR
            )),
            test: Some("gradle test --no-daemon".to_string()),
            prune: None,
            install_needs_source: false,
        }
    }

    fn declared_commands(
        &self,
        manifest: &ManifestData,
        files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        let source = files.first_present(BUILD_SCRIPTS).unwrap_or("build.gradle");
        let candidate =
            CommandCandidate::new("jar", format!("java -jar {}", APP_JAR), source).with_rank(0);
        match self.commands(manifest, files).build {
            Some(build) => vec![candidate.with_build(build)],
            None => vec![candidate],
        }
    }

    fn ignore_patterns(&self) -> &[&str] {
        &["build", ".gradle"]
    }

    fn stage_artifacts(&self, _commands: &BuildCommands, _start_command: &str) -> Option<StageArtifacts> {
        let jar = format!("/app/{}", APP_JAR);
        Some(StageArtifacts {
            from_build: vec![(jar.clone(), jar)],
            ..Default::default()
        })
    }
}
