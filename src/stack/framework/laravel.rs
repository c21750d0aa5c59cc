//! Laravel framework for PHP

use super::{DependencyPattern, Framework};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct LaravelFramework;

impl Framework for LaravelFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Laravel
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        &[BuildSystemId::Composer]
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("laravel/framework")]
    }

    fn marker_files(&self) -> &[&str] {
        &["artisan"]
    }

    fn default_ports(&self) -> &[u16] {
        &[8000]
    }

    fn start_command(&self, _files: &FileManifest, _manifest: &ManifestData) -> Option<String> {
        Some("php artisan serve --host=0.0.0.0 --port=8000".to_string())
    }
}
