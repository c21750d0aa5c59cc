//! Framework definitions
//!
//! Frameworks refine a build-system match. Detection is deterministic
//! dependency matching; marker files add support evidence. A framework may
//! also know its conventional start command and where it configures ports.

use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, FrameworkId};
use regex::Regex;

/// Dependency pattern for framework detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPattern {
    /// Exact normalized dependency name (`express`, `django`)
    Exact(&'static str),
    /// Dependency name prefix (`org.springframework.boot`)
    Prefix(&'static str),
}

impl DependencyPattern {
    pub fn matches(&self, dependency: &str) -> bool {
        match self {
            DependencyPattern::Exact(name) => dependency == *name,
            DependencyPattern::Prefix(prefix) => dependency.starts_with(prefix),
        }
    }
}

pub(crate) const NODE_BUILD_SYSTEMS: &[BuildSystemId] =
    &[BuildSystemId::Npm, BuildSystemId::Yarn, BuildSystemId::Pnpm];
pub(crate) const PYTHON_BUILD_SYSTEMS: &[BuildSystemId] =
    &[BuildSystemId::Pip, BuildSystemId::Poetry, BuildSystemId::Pipenv];
pub(crate) const JVM_BUILD_SYSTEMS: &[BuildSystemId] = &[BuildSystemId::Maven, BuildSystemId::Gradle];

/// Framework trait defining framework-specific behavior
pub trait Framework: Send + Sync {
    fn id(&self) -> FrameworkId;

    fn compatible_build_systems(&self) -> &[BuildSystemId];

    /// Runtime dependencies that identify the framework
    fn dependency_patterns(&self) -> &[DependencyPattern];

    /// Files whose presence supports the match
    fn marker_files(&self) -> &[&str] {
        &[]
    }

    /// Documented default ports, empty when the framework has no convention
    fn default_ports(&self) -> &[u16];

    /// Conventional start command when the manifest declares none
    fn start_command(&self, _files: &FileManifest, _manifest: &ManifestData) -> Option<String> {
        None
    }

    /// Ports configured in framework-specific configuration files
    fn config_ports(&self, _files: &FileManifest) -> Vec<u16> {
        Vec::new()
    }

    fn matches_manifest(&self, manifest: &ManifestData) -> bool {
        manifest
            .dependencies
            .iter()
            .any(|dep| self.dependency_patterns().iter().any(|p| p.matches(dep)))
    }
}

/// Ports captured by `pattern` across the listed files, in file order
pub(crate) fn ports_in_files(files: &FileManifest, paths: &[&str], pattern: &str) -> Vec<u16> {
    let Ok(re) = Regex::new(pattern) else {
        return Vec::new();
    };
    paths
        .iter()
        .filter_map(|path| files.read(path))
        .flat_map(|content| {
            re.captures_iter(&content)
                .filter_map(|cap| cap.get(1)?.as_str().parse::<u16>().ok())
                .collect::<Vec<_>>()
        })
        .filter(|port| *port > 0)
        .collect()
}

/// Locates the Python module defining an application object, returning
/// `(module, variable)` such as `("src.main", "app")`.
pub(crate) fn find_python_app(files: &FileManifest, constructor: &str) -> Option<(String, String)> {
    const CANDIDATES: &[&str] = &[
        "main.py",
        "app.py",
        "server.py",
        "wsgi.py",
        "asgi.py",
        "api.py",
        "app/main.py",
        "app/__init__.py",
        "src/main.py",
        "src/app.py",
    ];
    let re = Regex::new(&format!(r"(?m)^(\w+)\s*=\s*{}\(", regex::escape(constructor))).ok()?;

    CANDIDATES.iter().find_map(|path| {
        let content = files.read(path)?;
        let variable = re.captures(&content)?.get(1)?.as_str().to_string();
        let module = path
            .trim_end_matches(".py")
            .trim_end_matches("/__init__")
            .replace('/', ".");
        Some((module, variable))
    })
}

pub mod actix;
pub mod axum;
pub mod django;
pub mod echo;
pub mod express;
pub mod fastapi;
pub mod fastify;
pub mod flask;
pub mod gin;
pub mod laravel;
pub mod nestjs;
pub mod nextjs;
pub mod rails;
pub mod sinatra;
pub mod spring_boot;

pub use actix::ActixFramework;
pub use axum::AxumFramework;
pub use django::DjangoFramework;
pub use echo::EchoFramework;
pub use express::ExpressFramework;
pub use fastapi::FastApiFramework;
pub use fastify::FastifyFramework;
pub use flask::FlaskFramework;
pub use gin::GinFramework;
pub use laravel::LaravelFramework;
pub use nestjs::NestJsFramework;
pub use nextjs::NextJsFramework;
pub use rails::RailsFramework;
pub use sinatra::SinatraFramework;
pub use spring_boot::SpringBootFramework;
