//! Sinatra framework for Ruby

use super::{DependencyPattern, Framework};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct SinatraFramework;

impl Framework for SinatraFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Sinatra
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        &[BuildSystemId::Bundler]
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("sinatra")]
    }

    fn default_ports(&self) -> &[u16] {
        &[4567]
    }

    fn start_command(&self, files: &FileManifest, _manifest: &ManifestData) -> Option<String> {
        if files.contains("config.ru") {
            return Some("bundle exec rackup --host 0.0.0.0 --port 4567".to_string());
        }
        ["app.rb", "server.rb", "main.rb"]
            .iter()
            .find(|path| files.read(path).is_some_and(|c| c.contains("sinatra")))
            .map(|path| format!("bundle exec ruby {} -o 0.0.0.0", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::buildsystem::test_support::workspace;

    #[test]
    fn test_classic_app_file() {
        let (_t, files) = workspace(&[("server.rb", "require 'sinatra'\nget('/') { 'hi' }\n")]);
        assert_eq!(
            SinatraFramework
                .start_command(&files, &ManifestData::default())
                .as_deref(),
            Some("bundle exec ruby server.rb -o 0.0.0.0")
        );
    }
}
