use super::{BuildSystemId, FrameworkId, LanguageId};
use crate::stack::buildsystem::*;
use crate::stack::framework::*;
use crate::stack::language::*;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Directories never scanned, copied or measured as project sources
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    ".next",
    ".gradle",
    ".tox",
    "coverage",
];

/// Ordered, immutable table of every known language, build system and framework
pub struct StackRegistry {
    build_systems: BTreeMap<BuildSystemId, Box<dyn BuildSystem>>,
    languages: BTreeMap<LanguageId, Box<dyn LanguageDefinition>>,
    frameworks: BTreeMap<FrameworkId, Box<dyn Framework>>,
}

impl StackRegistry {
    /// Process-wide registry, built on first use
    pub fn global() -> &'static StackRegistry {
        static REGISTRY: OnceLock<StackRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StackRegistry::with_defaults)
    }

    pub fn with_defaults() -> Self {
        let mut languages: BTreeMap<LanguageId, Box<dyn LanguageDefinition>> = BTreeMap::new();
        for id in LanguageId::all_variants() {
            let language: Box<dyn LanguageDefinition> = match id {
                LanguageId::JavaScript => Box::new(JavaScriptLanguage),
                LanguageId::TypeScript => Box::new(TypeScriptLanguage),
                LanguageId::Python => Box::new(PythonLanguage),
                LanguageId::Go => Box::new(GoLanguage),
                LanguageId::Rust => Box::new(RustLanguage),
                LanguageId::Java => Box::new(JavaLanguage),
                LanguageId::Ruby => Box::new(RubyLanguage),
                LanguageId::Php => Box::new(PhpLanguage),
            };
            languages.insert(*id, language);
        }

        let mut build_systems: BTreeMap<BuildSystemId, Box<dyn BuildSystem>> = BTreeMap::new();
        for id in BuildSystemId::all_variants() {
            let bs: Box<dyn BuildSystem> = match id {
                BuildSystemId::Npm => Box::new(NpmBuildSystem),
                BuildSystemId::Yarn => Box::new(YarnBuildSystem),
                BuildSystemId::Pnpm => Box::new(PnpmBuildSystem),
                BuildSystemId::Pip => Box::new(PipBuildSystem),
                BuildSystemId::Poetry => Box::new(PoetryBuildSystem),
                BuildSystemId::Pipenv => Box::new(PipenvBuildSystem),
                BuildSystemId::GoMod => Box::new(GoModBuildSystem),
                BuildSystemId::Cargo => Box::new(CargoBuildSystem),
                BuildSystemId::Maven => Box::new(MavenBuildSystem),
                BuildSystemId::Gradle => Box::new(GradleBuildSystem),
                BuildSystemId::Bundler => Box::new(BundlerBuildSystem),
                BuildSystemId::Composer => Box::new(ComposerBuildSystem),
            };
            build_systems.insert(*id, bs);
        }

        let mut frameworks: BTreeMap<FrameworkId, Box<dyn Framework>> = BTreeMap::new();
        for id in FrameworkId::all_variants() {
            let fw: Box<dyn Framework> = match id {
                FrameworkId::Express => Box::new(ExpressFramework),
                FrameworkId::Fastify => Box::new(FastifyFramework),
                FrameworkId::NestJs => Box::new(NestJsFramework),
                FrameworkId::NextJs => Box::new(NextJsFramework),
                FrameworkId::Django => Box::new(DjangoFramework),
                FrameworkId::Flask => Box::new(FlaskFramework),
                FrameworkId::FastApi => Box::new(FastApiFramework),
                FrameworkId::Gin => Box::new(GinFramework),
                FrameworkId::Echo => Box::new(EchoFramework),
                FrameworkId::Axum => Box::new(AxumFramework),
                FrameworkId::ActixWeb => Box::new(ActixFramework),
                FrameworkId::SpringBoot => Box::new(SpringBootFramework),
                FrameworkId::Rails => Box::new(RailsFramework),
                FrameworkId::Sinatra => Box::new(SinatraFramework),
                FrameworkId::Laravel => Box::new(LaravelFramework),
            };
            frameworks.insert(*id, fw);
        }

        Self {
            build_systems,
            languages,
            frameworks,
        }
    }

    pub fn get_build_system(&self, id: BuildSystemId) -> Option<&dyn BuildSystem> {
        self.build_systems.get(&id).map(|bs| bs.as_ref())
    }

    pub fn get_language(&self, id: LanguageId) -> Option<&dyn LanguageDefinition> {
        self.languages.get(&id).map(|l| l.as_ref())
    }

    pub fn get_framework(&self, id: FrameworkId) -> Option<&dyn Framework> {
        self.frameworks.get(&id).map(|f| f.as_ref())
    }

    /// Build systems in identifier order
    pub fn build_systems(&self) -> impl Iterator<Item = &dyn BuildSystem> {
        self.build_systems.values().map(|bs| bs.as_ref())
    }

    /// Frameworks that can sit on top of `build_system`, in identifier order
    pub fn frameworks_for(&self, build_system: BuildSystemId) -> impl Iterator<Item = &dyn Framework> {
        self.frameworks
            .values()
            .map(|f| f.as_ref())
            .filter(move |f| f.compatible_build_systems().contains(&build_system))
    }

    /// Languages whose extensions include `extension`
    pub fn language_for_extension(&self, extension: &str) -> Option<LanguageId> {
        self.languages
            .values()
            .find(|l| l.extensions().contains(&extension))
            .map(|l| l.id())
    }
}

impl Default for StackRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
