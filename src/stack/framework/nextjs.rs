//! Next.js framework for JavaScript/TypeScript

use super::{DependencyPattern, Framework, NODE_BUILD_SYSTEMS};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct NextJsFramework;

impl Framework for NextJsFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::NextJs
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        NODE_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("next")]
    }

    fn marker_files(&self) -> &[&str] {
        &["next.config.js", "next.config.mjs", "next.config.ts"]
    }

    fn default_ports(&self) -> &[u16] {
        &[3000]
    }

    fn start_command(&self, _files: &FileManifest, _manifest: &ManifestData) -> Option<String> {
        Some("npx next start".to_string())
    }
}
