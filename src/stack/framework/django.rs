//! Django framework for Python

use super::{DependencyPattern, Framework, PYTHON_BUILD_SYSTEMS};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};

pub struct DjangoFramework;

impl DjangoFramework {
    /// Package holding `wsgi.py` next to `settings.py`
    fn project_module(files: &FileManifest) -> Option<String> {
        files
            .find_by_name("wsgi.py")
            .into_iter()
            .filter_map(|entry| entry.path.strip_suffix("/wsgi.py"))
            .find(|dir| files.contains(&format!("{}/settings.py", dir)))
            .map(|dir| dir.replace('/', "."))
    }
}

impl Framework for DjangoFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Django
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        PYTHON_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("django")]
    }

    fn marker_files(&self) -> &[&str] {
        &["manage.py"]
    }

    fn default_ports(&self) -> &[u16] {
        &[8000]
    }

    fn start_command(&self, files: &FileManifest, manifest: &ManifestData) -> Option<String> {
        if manifest.has_dependency("gunicorn") {
            if let Some(module) = Self::project_module(files) {
                return Some(format!(
                    "gunicorn {}.wsgi:application --bind 0.0.0.0:8000",
                    module
                ));
            }
        }
        files
            .contains("manage.py")
            .then(|| "python manage.py runserver 0.0.0.0:8000".to_string())
    }
}
