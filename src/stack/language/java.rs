//! Java language definition (Maven, Gradle)

use super::{version_from_file, BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{extract_version, ManifestData};
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

pub struct JavaLanguage;

impl JavaLanguage {
    /// `1.8` style versions map to their major release
    fn major(version: &str) -> Option<String> {
        let version = version.strip_prefix("1.").unwrap_or(version);
        version.split('.').next().map(String::from)
    }

    fn build_image(version: &str, build_system: BuildSystemId) -> String {
        match build_system {
            BuildSystemId::Gradle => format!("gradle:8-jdk{}", version),
            _ => format!("maven:3.9-eclipse-temurin-{}", version),
        }
    }
}

impl LanguageDefinition for JavaLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Java
    }

    fn extensions(&self) -> &[&str] {
        &["java", "kt"]
    }

    fn version_files(&self) -> &[&str] {
        &[".java-version"]
    }

    fn version_precision(&self) -> usize {
        1
    }

    fn default_version(&self) -> &'static str {
        "21"
    }

    fn detect_version(&self, files: &FileManifest, manifest: &ManifestData) -> Option<String> {
        let raw = self
            .version_files()
            .iter()
            .filter_map(|path| files.read(path))
            .find_map(|content| version_from_file(&content))
            .or_else(|| manifest.runtime_version.as_deref().and_then(extract_version))?;
        Self::major(&raw)
    }

    fn images(&self, version: &str, build_system: BuildSystemId) -> ImageSet {
        let build = BaseImage::new(Self::build_image(version, build_system), SizeClass::Large);
        ImageSet {
            single_stage: vec![build.clone()],
            build,
            runtime: Some(BaseImage::new(
                format!("eclipse-temurin:{}-jre", version),
                SizeClass::Medium,
            )),
        }
    }

    // The build tool declares the application jar
    fn conventional_commands(
        &self,
        _files: &FileManifest,
        _manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        Vec::new()
    }

    fn port_patterns(&self) -> &[&str] {
        &[
            r"\.port\(\s*(\d{2,5})\s*\)",
            r"new\s+InetSocketAddress\(\s*(\d{2,5})",
        ]
    }

    fn ci_setup(&self, version: &str, build_system: BuildSystemId) -> CiSetup {
        let cache = match build_system {
            BuildSystemId::Gradle => "gradle",
            _ => "maven",
        };
        CiSetup {
            action: "actions/setup-java@v4",
            with: vec![
                ("distribution", "temurin".to_string()),
                ("java-version", version.to_string()),
                ("cache", cache.to_string()),
            ],
            image: Self::build_image(version, build_system),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_major_version() {
        assert_eq!(JavaLanguage::major("1.8").as_deref(), Some("8"));
        assert_eq!(JavaLanguage::major("17").as_deref(), Some("17"));
        assert_eq!(JavaLanguage::major("21.0.2").as_deref(), Some("21"));
    }

    #[test]
    fn test_images_follow_build_system() {
        let maven = JavaLanguage.images("17", BuildSystemId::Maven);
        assert_eq!(maven.build.image, "maven:3.9-eclipse-temurin-17");
        let gradle = JavaLanguage.images("17", BuildSystemId::Gradle);
        assert_eq!(gradle.build.image, "gradle:8-jdk17");
        assert_eq!(gradle.runtime.unwrap().image, "eclipse-temurin:17-jre");
    }
}
