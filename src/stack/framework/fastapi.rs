//! FastAPI framework for Python

use super::{find_python_app, DependencyPattern, Framework, PYTHON_BUILD_SYSTEMS};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct FastApiFramework;

impl Framework for FastApiFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::FastApi
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        PYTHON_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("fastapi")]
    }

    fn default_ports(&self) -> &[u16] {
        &[8000]
    }

    fn start_command(&self, files: &FileManifest, _manifest: &ManifestData) -> Option<String> {
        let (module, variable) = find_python_app(files, "FastAPI")?;
        Some(format!(
            "uvicorn {}:{} --host 0.0.0.0 --port 8000",
            module, variable
        ))
    }
}
