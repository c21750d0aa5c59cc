//! NestJS framework for TypeScript

use super::{DependencyPattern, Framework, NODE_BUILD_SYSTEMS};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct NestJsFramework;

impl Framework for NestJsFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::NestJs
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        NODE_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("@nestjs/core")]
    }

    fn marker_files(&self) -> &[&str] {
        &["nest-cli.json"]
    }

    fn default_ports(&self) -> &[u16] {
        &[3000]
    }

    fn start_command(&self, _files: &FileManifest, _manifest: &ManifestData) -> Option<String> {
        Some("node dist/main".to_string())
    }
}
