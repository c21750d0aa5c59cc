//! Ruby on Rails framework

use super::{ports_in_files, DependencyPattern, Framework};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct RailsFramework;

impl Framework for RailsFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Rails
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        &[BuildSystemId::Bundler]
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("rails"), DependencyPattern::Exact("railties")]
    }

    fn marker_files(&self) -> &[&str] {
        &["config/routes.rb", "config/application.rb", "bin/rails"]
    }

    fn default_ports(&self) -> &[u16] {
        &[3000]
    }

    fn start_command(&self, _files: &FileManifest, _manifest: &ManifestData) -> Option<String> {
        Some("bundle exec rails server -b 0.0.0.0".to_string())
    }

    fn config_ports(&self, files: &FileManifest) -> Vec<u16> {
        ports_in_files(
            files,
            &["config/puma.rb"],
            r#"(?m)^\s*port\s+(?:ENV\.fetch\([^)]*\)\s*\{\s*)?(\d+)"#,
        )
    }
}
