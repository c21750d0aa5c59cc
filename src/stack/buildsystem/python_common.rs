//! Shared logic for the Python package managers

use super::StageArtifacts;
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;

pub(super) const PYTHON_IGNORE: &[&str] = &[
    "__pycache__",
    "*.pyc",
    ".venv",
    "venv",
    ".pytest_cache",
    ".mypy_cache",
    ".tox",
];

const VENV: &str = "/opt/venv";

/// `runner` prefixes the test tool (`poetry run`), empty for system installs
pub(super) fn python_test_command(
    manifest: &ManifestData,
    files: &FileManifest,
    runner: &str,
) -> Option<String> {
    let prefix = if runner.is_empty() {
        String::new()
    } else {
        format!("{} ", runner)
    };

    if manifest.has_any_dependency("pytest")
        || files.contains("pytest.ini")
        || files.contains("conftest.py")
    {
        Some(format!("{}python -m pytest", prefix))
    } else if files.contains("manage.py") {
        Some(format!("{}python manage.py test", prefix))
    } else {
        None
    }
}

/// Dependencies go into a virtualenv that the runtime stage copies wholesale
pub(super) fn venv_artifacts() -> StageArtifacts {
    StageArtifacts {
        prepare: vec![format!("python -m venv {}", VENV)],
        env: vec![
            ("VIRTUAL_ENV".to_string(), VENV.to_string()),
            ("PATH".to_string(), format!("{}/bin:$PATH", VENV)),
        ],
        runtime_env: Vec::new(),
        from_build: vec![(VENV.to_string(), VENV.to_string())],
        copy_sources: true,
    }
}
