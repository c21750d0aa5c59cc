//! Result bundle returned to callers
//!
//! `GenerationResult` is the terminal, immutable output of one analysis. It is
//! serializable so collaborators (history store, deployment trigger, UI) can
//! consume it without linking against the pipeline types.

use crate::pipeline::phases::classify::ProjectProfile;
use crate::pipeline::phases::entrypoint::Entrypoint;
use crate::pipeline::phases::optimize::DecisionRecord;
use crate::pipeline::phases::template::BuildStrategy;
use crate::pipeline::request::CiTarget;
use crate::stack::SizeClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DOCKERFILE_PATH: &str = "Dockerfile";
pub const COMPOSE_PATH: &str = "docker-compose.yml";
pub const REPORT_PATH: &str = "DOCKMATE_REPORT.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    /// No port could be detected and the framework has no convention
    MissingPort,
    /// Runtime version unknown, a default image tag was used
    FallbackBaseImage,
    /// A CI stage has no command and was replaced by a skip marker
    SkippedCiStage,
    /// Start command comes from a file-name convention, not a manifest
    ConventionEntrypoint,
    ExistingDockerfile,
    ExistingCompose,
    /// The file walk hit its limit before seeing every file
    TruncatedScan,
}

/// Non-fatal finding attached to a successful result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
}

impl Warning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    SuccessWithWarnings,
}

impl ResultStatus {
    pub fn from_warnings(warnings: &[Warning]) -> Self {
        if warnings.is_empty() {
            ResultStatus::Success
        } else {
            ResultStatus::SuccessWithWarnings
        }
    }
}

/// Summary of the template candidate the optimizer picked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedTemplate {
    pub label: String,
    pub base_image: String,
    pub strategy: BuildStrategy,
    pub size: SizeClass,
    pub instruction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowArtifact {
    pub target: CiTarget,
    /// Where the file belongs in the repository
    pub path: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub candidates_considered: usize,
    /// One record per scoring criterion that was consulted, in order
    pub decisions: Vec<DecisionRecord>,
    /// Advisory `.dockerignore` entries
    pub ignore_list: Vec<String>,
    pub markdown: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub status: ResultStatus,
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    pub profile: ProjectProfile,
    pub entrypoint: Entrypoint,
    pub selected: SelectedTemplate,
    pub dockerfile: String,
    pub compose: String,
    pub workflow: WorkflowArtifact,
    pub report: OptimizationReport,
    pub warnings: Vec<Warning>,
    /// Well-known files found in the repository
    pub files_collected: Vec<String>,
    pub ci_instructions: String,
    /// SHA-256 over the generated artifacts
    pub fingerprint: String,
    pub generated_at: DateTime<Utc>,
}

impl GenerationResult {
    /// `(relative path, contents)` of every file the result would write
    pub fn artifact_files(&self) -> Vec<(&str, &str)> {
        vec![
            (DOCKERFILE_PATH, self.dockerfile.as_str()),
            (COMPOSE_PATH, self.compose.as_str()),
            (self.workflow.path.as_str(), self.workflow.text.as_str()),
            (REPORT_PATH, self.report.markdown.as_str()),
        ]
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Output of a detect-only run
#[derive(Debug, Clone, Serialize)]
pub struct InspectionResult {
    pub repository: String,
    pub profile: ProjectProfile,
    pub entrypoint: Entrypoint,
    pub warnings: Vec<Warning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_warnings() {
        assert_eq!(ResultStatus::from_warnings(&[]), ResultStatus::Success);
        let warnings = vec![Warning::new(WarningCode::MissingPort, "no port")];
        assert_eq!(
            ResultStatus::from_warnings(&warnings),
            ResultStatus::SuccessWithWarnings
        );
    }

    #[test]
    fn test_warning_code_serialization() {
        let warning = Warning::new(WarningCode::FallbackBaseImage, "using node:20");
        let json = serde_json::to_string(&warning).unwrap();
        assert_eq!(
            json,
            r#"{"code":"fallback_base_image","message":"using node:20"}"#
        );
    }
}
