//! Maven build system (Java)

use super::{BuildCommands, BuildSystem, ManifestPattern, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_pom, ManifestData};
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};
use tracing::debug;

const PATTERNS: &[ManifestPattern] = &[ManifestPattern::manifest("pom.xml")];

/// Jar produced by the build, independent of the artifact's versioned name
pub(super) const APP_JAR: &str = "app.jar";

pub struct MavenBuildSystem;

impl BuildSystem for MavenBuildSystem {
    fn id(&self) -> BuildSystemId {
        BuildSystemId::Maven
    }

    fn language(&self) -> LanguageId {
        LanguageId::Java
    }

    fn package_manager(&self) -> &'static str {
        "maven"
    }

    fn manifest_patterns(&self) -> &[ManifestPattern] {
        PATTERNS
    }

    fn parse_manifest(&self, files: &FileManifest) -> ManifestData {
        files
            .read("pom.xml")
            .and_then(|c| {
                parse_pom(&c)
                    .map_err(|e| debug!(error = %e, "Ignoring unparsable pom.xml"))
                    .ok()
            })
            .unwrap_or_default()
    }

    fn commands(&self, _manifest: &ManifestData, _files: &FileManifest) -> BuildCommands {
        BuildCommands {
            install: Some("mvn -B dependency:go-offline".to_string()),
            ci_install: None,
            build: Some(format!(
                "mvn -B package -DskipTests && cp \"$(ls target/*.jar | grep -v original | head -n 1)\" {}",
                APP_JAR
            )),
            test: Some("mvn -B test".to_string()),
            prune: None,
            install_needs_source: false,
        }
    }

    fn declared_commands(
        &self,
        _manifest: &ManifestData,
        files: &FileManifest,
    ) -> Vec<CommandCandidate> {
        let commands = self.commands(&ManifestData::default(), files);
        let candidate = CommandCandidate::new("jar", format!("java -jar {}", APP_JAR), "pom.xml")
            .with_rank(0);
        match commands.build {
            Some(build) => vec![candidate.with_build(build)],
            None => vec![candidate],
        }
    }

    fn ignore_patterns(&self) -> &[&str] {
        &["target"]
    }

    fn stage_artifacts(&self, _commands: &BuildCommands, _start_command: &str) -> Option<StageArtifacts> {
        let jar = format!("/app/{}", APP_JAR);
        Some(StageArtifacts {
            from_build: vec![(jar.clone(), jar)],
            ..Default::default()
        })
    }
}
