//! Template engine
//!
//! Turns a profile and its entrypoint into ordered Dockerfile candidates.
//! Single-stage variants come first, one per runtime flavour of the language,
//! followed by the multi-stage variant when the build system can separate
//! its output from the toolchain.

use super::classify::ProjectProfile;
use super::entrypoint::Entrypoint;
use crate::output::schema::{Warning, WarningCode};
use crate::pipeline::request::GenerationPreferences;
use crate::stack::{
    BaseImage, BuildSystem, LanguageDefinition, SizeClass, StackRegistry, StageArtifacts,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const BUILD_STAGE: &str = "build";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStrategy {
    SingleStage,
    MultiStage,
}

impl fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStrategy::SingleStage => write!(f, "single-stage"),
            BuildStrategy::MultiStage => write!(f, "multi-stage"),
        }
    }
}

/// One Dockerfile instruction, rendered by [`crate::render::dockerfile`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Instruction {
    From {
        image: String,
        alias: Option<String>,
    },
    Workdir(String),
    Env(Vec<(String, String)>),
    Copy {
        from: Option<String>,
        sources: Vec<String>,
        dest: String,
    },
    Run(String),
    Expose(Vec<u16>),
    Cmd(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateCandidate {
    /// Position in emission order
    pub index: usize,
    pub label: String,
    /// Image of the final stage
    pub base_image: String,
    pub strategy: BuildStrategy,
    pub size: SizeClass,
    pub instructions: Vec<Instruction>,
}

impl TemplateCandidate {
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    pub candidates: Vec<TemplateCandidate>,
    pub warnings: Vec<Warning>,
}

/// Builds every applicable candidate; an empty set means no template exists
pub fn build_candidates(
    profile: &ProjectProfile,
    entrypoint: &Entrypoint,
    preferences: &GenerationPreferences,
) -> TemplateSet {
    let registry = StackRegistry::global();
    let (Some(build_system), Some(language)) = (
        registry.get_build_system(profile.build_system),
        registry.get_language(profile.language),
    ) else {
        return TemplateSet::default();
    };

    let mut warnings = Vec::new();
    let version = match &profile.runtime_version {
        Some(version) => version.clone(),
        None => {
            let fallback = language.default_version();
            warnings.push(Warning::new(
                WarningCode::FallbackBaseImage,
                format!(
                    "no {} version was detected; images are tagged with the default {}",
                    profile.language, fallback
                ),
            ));
            fallback.to_string()
        }
    };

    let images = language.images(&version, build_system.id());
    let blueprint = Blueprint {
        profile,
        entrypoint,
        build_system,
        language,
    };
    let final_image = |image: &BaseImage| match &preferences.base_image {
        Some(custom) => BaseImage::estimated(custom.clone()),
        None => image.clone(),
    };

    let mut candidates = Vec::new();
    for image in &images.single_stage {
        let image = final_image(image);
        candidates.push(blueprint.single_stage(candidates.len(), &image));
    }

    if !preferences.force_single_stage {
        let artifacts = build_system.stage_artifacts(&entrypoint.commands, &entrypoint.start_command);
        if let (Some(artifacts), Some(runtime)) = (artifacts, images.runtime.as_ref()) {
            let runtime = final_image(runtime);
            candidates.push(blueprint.multi_stage(
                candidates.len(),
                &images.build,
                &runtime,
                &artifacts,
            ));
        }
    }

    debug!(
        count = candidates.len(),
        labels = ?candidates.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(),
        "Template candidates built"
    );
    TemplateSet {
        candidates,
        warnings,
    }
}

struct Blueprint<'a> {
    profile: &'a ProjectProfile,
    entrypoint: &'a Entrypoint,
    build_system: &'a dyn BuildSystem,
    language: &'a dyn LanguageDefinition,
}

impl Blueprint<'_> {
    fn single_stage(&self, index: usize, image: &BaseImage) -> TemplateCandidate {
        let mut out = vec![Instruction::From {
            image: image.image.clone(),
            alias: None,
        }];
        self.toolchain(&mut out, &[], &[]);
        self.launch(&mut out);

        TemplateCandidate {
            index,
            label: format!("single-stage on {}", image.image),
            base_image: image.image.clone(),
            strategy: BuildStrategy::SingleStage,
            size: image.size,
            instructions: out,
        }
    }

    fn multi_stage(
        &self,
        index: usize,
        build: &BaseImage,
        runtime: &BaseImage,
        artifacts: &StageArtifacts,
    ) -> TemplateCandidate {
        let mut out = vec![Instruction::From {
            image: build.image.clone(),
            alias: Some(BUILD_STAGE.to_string()),
        }];
        self.toolchain(&mut out, &artifacts.env, &artifacts.prepare);
        if let Some(prune) = &self.entrypoint.commands.prune {
            out.push(Instruction::Run(prune.clone()));
        }

        out.push(Instruction::From {
            image: runtime.image.clone(),
            alias: None,
        });
        out.push(Instruction::Workdir(self.entrypoint.working_dir.clone()));
        let mut runtime_env = self.image_env(&artifacts.env);
        runtime_env.extend(artifacts.runtime_env.iter().cloned());
        if !runtime_env.is_empty() {
            out.push(Instruction::Env(runtime_env));
        }
        for (source, dest) in &artifacts.from_build {
            out.push(Instruction::Copy {
                from: Some(BUILD_STAGE.to_string()),
                sources: vec![source.clone()],
                dest: dest.clone(),
            });
        }
        if artifacts.copy_sources {
            out.push(copy_context());
        }
        self.launch(&mut out);

        TemplateCandidate {
            index,
            label: format!("multi-stage {} -> {}", build.image, runtime.image),
            base_image: runtime.image.clone(),
            strategy: BuildStrategy::MultiStage,
            size: runtime.size,
            instructions: out,
        }
    }

    fn image_env(&self, extra: &[(String, String)]) -> Vec<(String, String)> {
        self.language
            .image_env()
            .iter()
            .chain(self.build_system.image_env())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .chain(extra.iter().cloned())
            .collect()
    }

    /// Workdir, environment, dependency layer, sources and build step
    fn toolchain(&self, out: &mut Vec<Instruction>, extra_env: &[(String, String)], prepare: &[String]) {
        if let Some((image, path)) = self.build_system.tool_image() {
            out.push(Instruction::Copy {
                from: Some(image.to_string()),
                sources: vec![path.to_string()],
                dest: path.to_string(),
            });
        }
        out.push(Instruction::Workdir(self.entrypoint.working_dir.clone()));

        let env = self.image_env(extra_env);
        if !env.is_empty() {
            out.push(Instruction::Env(env));
        }

        let setup: Vec<String> = prepare
            .iter()
            .cloned()
            .chain(self.build_system.setup_commands().iter().map(|s| s.to_string()))
            .collect();
        if !setup.is_empty() {
            out.push(Instruction::Run(setup.join(" && ")));
        }

        let commands = &self.entrypoint.commands;
        if !self.profile.dependency_files.is_empty() {
            out.push(Instruction::Copy {
                from: None,
                sources: self.profile.dependency_files.clone(),
                dest: "./".to_string(),
            });
        }
        if !commands.install_needs_source {
            if let Some(install) = &commands.install {
                out.push(Instruction::Run(install.clone()));
            }
        }
        out.push(copy_context());
        if commands.install_needs_source {
            if let Some(install) = &commands.install {
                out.push(Instruction::Run(install.clone()));
            }
        }
        if let Some(build) = &self.entrypoint.build_command {
            out.push(Instruction::Run(build.clone()));
        }
    }

    fn launch(&self, out: &mut Vec<Instruction>) {
        if let Some(port) = self.entrypoint.primary_port() {
            out.push(Instruction::Env(vec![("PORT".to_string(), port.to_string())]));
            out.push(Instruction::Expose(self.entrypoint.ports.clone()));
        }
        out.push(Instruction::Cmd(command_argv(&self.entrypoint.start_command)));
    }
}

fn copy_context() -> Instruction {
    Instruction::Copy {
        from: None,
        sources: vec![".".to_string()],
        dest: ".".to_string(),
    }
}

/// Exec-form argv, wrapped in `sh -c` when the command relies on a shell
pub fn command_argv(command: &str) -> Vec<String> {
    const SHELL_CHARS: &[char] = &['&', '|', ';', '<', '>', '$', '`', '*', '(', ')', '"', '\'', '\\'];
    let leading_assignment = command
        .split_whitespace()
        .next()
        .is_some_and(|word| word.contains('=') && !word.starts_with('-'));

    if command.contains(SHELL_CHARS) || leading_assignment {
        vec!["sh".to_string(), "-c".to_string(), command.to_string()]
    } else {
        command.split_whitespace().map(String::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phases::classify::classify;
    use crate::pipeline::phases::entrypoint::resolve;
    use crate::stack::buildsystem::test_support::workspace;

    fn candidates_for(files: &[(&str, &str)], preferences: &GenerationPreferences) -> TemplateSet {
        let (_t, manifest) = workspace(files);
        let profile = classify(&manifest).unwrap();
        let entrypoint = resolve(&manifest, &profile).unwrap().entrypoint;
        build_candidates(&profile, &entrypoint, preferences)
    }

    const NODE_BUILD_APP: &[(&str, &str)] = &[
        (
            "package.json",
            r#"{"engines": {"node": "20.x"}, "scripts": {"build": "tsc", "start": "node dist/index.js"}}"#,
        ),
        ("package-lock.json", "{}"),
    ];

    #[test]
    fn test_node_candidates_in_emission_order() {
        let set = candidates_for(NODE_BUILD_APP, &GenerationPreferences::default());
        let labels: Vec<_> = set.candidates.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "single-stage on node:20-slim",
                "single-stage on node:20-alpine",
                "multi-stage node:20 -> node:20-alpine",
            ]
        );
        assert!(set.warnings.is_empty());

        let multi = &set.candidates[2];
        assert_eq!(multi.strategy, BuildStrategy::MultiStage);
        assert!(multi.instructions.contains(&Instruction::Run("npm prune --omit=dev".to_string())));
    }

    #[test]
    fn test_dependency_files_copied_before_sources() {
        let set = candidates_for(NODE_BUILD_APP, &GenerationPreferences::default());
        for candidate in &set.candidates {
            let deps = candidate
                .instructions
                .iter()
                .position(|i| matches!(i, Instruction::Copy { sources, .. } if sources.contains(&"package.json".to_string())))
                .unwrap();
            let context = candidate
                .instructions
                .iter()
                .position(|i| *i == copy_context())
                .unwrap();
            assert!(deps < context, "{}", candidate.label);
        }
    }

    #[test]
    fn test_force_single_stage_and_override() {
        let preferences = GenerationPreferences {
            force_single_stage: true,
            base_image: Some("registry.local/node:20-hardened".to_string()),
            ..Default::default()
        };
        let set = candidates_for(NODE_BUILD_APP, &preferences);
        assert_eq!(set.candidates.len(), 2);
        assert!(set
            .candidates
            .iter()
            .all(|c| c.strategy == BuildStrategy::SingleStage
                && c.base_image == "registry.local/node:20-hardened"
                && c.size == SizeClass::Large));
    }

    #[test]
    fn test_missing_version_falls_back_with_warning() {
        let set = candidates_for(
            &[("requirements.txt", "flask\n"), ("app.py", "app = Flask(__name__)\n")],
            &GenerationPreferences::default(),
        );
        assert_eq!(set.warnings.len(), 1);
        assert_eq!(set.warnings[0].code, WarningCode::FallbackBaseImage);
        assert_eq!(set.candidates[0].base_image, "python:3.12-slim");
        assert_eq!(set.candidates.last().unwrap().strategy, BuildStrategy::MultiStage);
    }

    #[test]
    fn test_go_binary_multi_stage() {
        let set = candidates_for(
            &[("go.mod", "module example.com/api\n\ngo 1.22\n"), ("main.go", "package main\n")],
            &GenerationPreferences::default(),
        );
        let multi = set.candidates.last().unwrap();
        assert_eq!(multi.base_image, "gcr.io/distroless/static-debian12");
        assert!(multi.instructions.contains(&Instruction::Copy {
            from: Some(BUILD_STAGE.to_string()),
            sources: vec!["/app/bin/api".to_string()],
            dest: "/app/bin/api".to_string(),
        }));
        assert_eq!(
            multi.instructions.last(),
            Some(&Instruction::Cmd(vec!["./bin/api".to_string()]))
        );
    }

    #[test]
    fn test_command_argv() {
        assert_eq!(command_argv("npm start"), vec!["npm", "start"]);
        assert_eq!(
            command_argv("bundle exec rails db:migrate && bundle exec rails s"),
            vec!["sh", "-c", "bundle exec rails db:migrate && bundle exec rails s"]
        );
        assert_eq!(command_argv("NODE_ENV=production node .")[0], "sh");
    }
}
