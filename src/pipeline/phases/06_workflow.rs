//! Workflow synthesizer
//!
//! Plans a three-stage CI pipeline (install, build/test, publish) from the
//! package manager's commands. A stage without a command becomes an explicit
//! skip marker and a warning, never a failure.

use super::classify::ProjectProfile;
use super::entrypoint::Entrypoint;
use crate::output::schema::{Warning, WarningCode, WorkflowArtifact};
use crate::pipeline::error::{FailureReason, GenerationError, ResolveError, StageError};
use crate::pipeline::request::CiTarget;
use crate::render;
use crate::stack::{CiSetup, StackRegistry};
use tracing::debug;

/// A CI step that either runs a command or records why it was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCommand {
    Run(String),
    Skip(String),
}

impl StepCommand {
    fn from_option(command: Option<&str>, stage: &str, profile: &ProjectProfile) -> Self {
        match command {
            Some(command) => StepCommand::Run(command.to_string()),
            None => StepCommand::Skip(format!(
                "no {} step for {} with {}",
                stage, profile.language, profile.build_system
            )),
        }
    }

    /// Shell line for the step, an `echo` marker when skipped
    pub fn shell(&self) -> String {
        match self {
            StepCommand::Run(command) => command.clone(),
            StepCommand::Skip(reason) => format!("echo \"Skipping: {}\"", reason),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepCommand::Skip(_))
    }
}

/// Everything a renderer needs to write a workflow file
#[derive(Debug, Clone)]
pub struct WorkflowPlan {
    pub target: CiTarget,
    pub setup: CiSetup,
    /// Container image for runners that execute jobs in containers
    pub job_image: String,
    pub setup_commands: Vec<String>,
    pub install: StepCommand,
    pub build: StepCommand,
    pub test: StepCommand,
    /// Dependency directories handed from the install job to later jobs
    pub cache_dirs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SynthesizedWorkflow {
    pub artifact: WorkflowArtifact,
    pub instructions: String,
    pub warnings: Vec<Warning>,
}

pub fn plan(
    profile: &ProjectProfile,
    entrypoint: &Entrypoint,
    target: CiTarget,
) -> Result<WorkflowPlan, ResolveError> {
    let registry = StackRegistry::global();
    let no_template = || ResolveError::NoTemplate {
        language: profile.language.to_string(),
        build_system: profile.build_system.to_string(),
    };
    let build_system = registry
        .get_build_system(profile.build_system)
        .ok_or_else(no_template)?;
    let language = registry.get_language(profile.language).ok_or_else(no_template)?;

    let version = profile
        .runtime_version
        .clone()
        .unwrap_or_else(|| language.default_version().to_string());
    let setup = language.ci_setup(&version, build_system.id());

    // Tool images bundle their own prerequisites
    let (job_image, setup_commands) = match build_system.tool_image() {
        Some((image, _)) => (image.to_string(), Vec::new()),
        None => (
            setup.image.clone(),
            build_system
                .setup_commands()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        ),
    };

    Ok(WorkflowPlan {
        target,
        job_image,
        setup_commands,
        install: StepCommand::from_option(entrypoint.commands.ci_install(), "install", profile),
        build: StepCommand::from_option(entrypoint.build_command.as_deref(), "build", profile),
        test: StepCommand::from_option(entrypoint.test_command.as_deref(), "test", profile),
        cache_dirs: build_system.cache_dirs().iter().map(|d| d.to_string()).collect(),
        setup,
    })
}

pub fn synthesize(
    profile: &ProjectProfile,
    entrypoint: &Entrypoint,
    target: CiTarget,
) -> Result<SynthesizedWorkflow, SynthesisError> {
    let plan = plan(profile, entrypoint, target)?;

    let warnings: Vec<Warning> = [("install", &plan.install), ("build", &plan.build), ("test", &plan.test)]
        .into_iter()
        .filter(|(_, step)| step.is_skipped())
        .map(|(stage, _)| {
            Warning::new(
                WarningCode::SkippedCiStage,
                format!("CI {} stage has no command and is emitted as a skip marker", stage),
            )
        })
        .collect();

    let text = render::workflow::render(&plan)?;
    debug!(target = ?target, skipped = warnings.len(), "Workflow synthesized");

    Ok(SynthesizedWorkflow {
        artifact: WorkflowArtifact {
            target,
            path: target.workflow_path().to_string(),
            text,
        },
        instructions: ci_instructions(target),
        warnings,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Render(#[from] GenerationError),
}

impl StageError for SynthesisError {
    fn reason(&self) -> FailureReason {
        match self {
            SynthesisError::Resolve(e) => e.reason(),
            SynthesisError::Render(e) => e.reason(),
        }
    }

    fn details(&self) -> Vec<String> {
        match self {
            SynthesisError::Resolve(e) => e.details(),
            SynthesisError::Render(e) => e.details(),
        }
    }
}

fn ci_instructions(target: CiTarget) -> String {
    match target {
        CiTarget::Github => "Commit the workflow as .github/workflows/ci.yml. It installs, builds and tests \
on every push and pull request, then publishes the image to ghcr.io on pushes to main using the built-in \
GITHUB_TOKEN. Make sure workflow permissions allow writing packages (Settings > Actions > General)."
            .to_string(),
        CiTarget::Gitlab => "Commit the pipeline as .gitlab-ci.yml at the repository root. The publish job \
pushes to the project's container registry using the predefined CI_REGISTRY, CI_REGISTRY_USER and \
CI_REGISTRY_PASSWORD variables and needs a runner that allows Docker-in-Docker (privileged mode)."
            .to_string(),
    }
}
