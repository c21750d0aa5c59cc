//! Spring Boot framework for Java/Kotlin

use super::{ports_in_files, DependencyPattern, Framework, JVM_BUILD_SYSTEMS};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::{BuildSystemId, FrameworkId};

const PROPERTIES: &str = "src/main/resources/application.properties";
const YAML: &[&str] = &[
    "src/main/resources/application.yml",
    "src/main/resources/application.yaml",
];

pub struct SpringBootFramework;

impl Framework for SpringBootFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::SpringBoot
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        JVM_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Prefix("org.springframework.boot")]
    }

    fn marker_files(&self) -> &[&str] {
        &[
            "src/main/resources/application.properties",
            "src/main/resources/application.yml",
            "src/main/resources/application.yaml",
        ]
    }

    fn default_ports(&self) -> &[u16] {
        &[8080]
    }

    fn config_ports(&self, files: &FileManifest) -> Vec<u16> {
        let mut ports = ports_in_files(files, &[PROPERTIES], r"(?m)^\s*server\.port\s*[=:]\s*(\d+)");
        ports.extend(ports_in_files(files, YAML, r"(?m)^\s+port:\s*(\d+)"));
        ports
    }
}
