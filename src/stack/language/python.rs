//! Python language definition (pip, poetry, pipenv)

use super::{first_entry_file, BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};

const ENTRY_FILES: &[&str] = &[
    "main.py",
    "app.py",
    "server.py",
    "run.py",
    "wsgi.py",
    "src/main.py",
    "src/app.py",
];

pub struct PythonLanguage;

impl LanguageDefinition for PythonLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Python
    }

    fn extensions(&self) -> &[&str] {
        &["py"]
    }

    fn version_files(&self) -> &[&str] {
        &[".python-version", "runtime.txt"]
    }

    fn default_version(&self) -> &'static str {
        "3.12"
    }

    fn images(&self, version: &str, _build_system: BuildSystemId) -> ImageSet {
        ImageSet {
            build: BaseImage::new(format!("python:{}", version), SizeClass::Large),
            single_stage: vec![BaseImage::new(
                format!("python:{}-slim", version),
                SizeClass::Medium,
            )],
            runtime: Some(BaseImage::new(
                format!("python:{}-slim", version),
                SizeClass::Medium,
            )),
        }
    }

    fn conventional_commands(
        &self,
        files: &FileManifest,
        _manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        first_entry_file(files, ENTRY_FILES, |file| format!("python {}", file))
    }

    fn port_patterns(&self) -> &[&str] {
        &[
            r"port\s*=\s*(\d{2,5})",
            r#"["']0\.0\.0\.0:(\d{2,5})["']"#,
            r"--port[= ](\d{2,5})",
        ]
    }

    fn image_env(&self) -> &[(&str, &str)] {
        &[("PYTHONDONTWRITEBYTECODE", "1"), ("PYTHONUNBUFFERED", "1")]
    }

    fn ci_setup(&self, version: &str, build_system: BuildSystemId) -> CiSetup {
        let mut with = vec![("python-version", version.to_string())];
        match build_system {
            BuildSystemId::Pip => with.push(("cache", "pip".to_string())),
            BuildSystemId::Pipenv => with.push(("cache", "pipenv".to_string())),
            _ => {}
        }
        CiSetup {
            action: "actions/setup-python@v5",
            with,
            image: format!("python:{}", version),
        }
    }
}
