//! Flask framework for Python

use super::{find_python_app, DependencyPattern, Framework, PYTHON_BUILD_SYSTEMS};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct FlaskFramework;

impl Framework for FlaskFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Flask
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        PYTHON_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("flask")]
    }

    fn default_ports(&self) -> &[u16] {
        &[5000]
    }

    fn start_command(&self, files: &FileManifest, manifest: &ManifestData) -> Option<String> {
        let (module, variable) = find_python_app(files, "Flask")?;
        if manifest.has_dependency("gunicorn") {
            Some(format!("gunicorn --bind 0.0.0.0:5000 {}:{}", module, variable))
        } else {
            Some(format!(
                "flask --app {}:{} run --host 0.0.0.0 --port 5000",
                module, variable
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::buildsystem::test_support::workspace;

    #[test]
    fn test_start_command_prefers_gunicorn() {
        let (_t, files) = workspace(&[("app.py", "from flask import Flask\napp = Flask(__name__)\n")]);
        let mut manifest = ManifestData::default();
        assert_eq!(
            FlaskFramework.start_command(&files, &manifest).as_deref(),
            Some("flask --app app:app run --host 0.0.0.0 --port 5000")
        );

        manifest.dependencies.insert("gunicorn".to_string());
        assert_eq!(
            FlaskFramework.start_command(&files, &manifest).as_deref(),
            Some("gunicorn --bind 0.0.0.0:5000 app:app")
        );
    }
}
