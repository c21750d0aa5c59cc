//! Stage errors and the failure reported to callers

use super::state::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable failure code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    TooLarge,
    Timeout,
    NotFound,
    AccessDenied,
    InvalidReference,
    Unavailable,
    Ambiguous,
    Unrecognized,
    NoEntrypoint,
    NoTemplate,
    TemplateRenderFailure,
    Cancelled,
    Internal,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Common surface of every stage-local error
pub trait StageError: std::error::Error {
    fn reason(&self) -> FailureReason;

    /// Context a human needs to fix the problem by hand
    fn details(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("ambiguous project: {} match equally ({support} supporting files each)", join_and(.candidates))]
    Ambiguous {
        candidates: Vec<String>,
        support: usize,
        /// Every signature that matched, best first
        matched: Vec<String>,
    },

    #[error("ambiguous project: lockfiles of {} are all present", join_and(.candidates))]
    ConflictingLockfiles {
        candidates: Vec<String>,
        /// `(package manager, lockfile)` pairs, in registry order
        lockfiles: Vec<(String, String)>,
    },

    #[error("unrecognized project: no manifest signature matched{}", hint_suffix(.hint))]
    Unrecognized { hint: Option<String> },
}

fn join_and(items: &[String]) -> String {
    items.join(" and ")
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_deref()
        .map(|h| format!(" ({})", h))
        .unwrap_or_default()
}

fn entrypoint_summary(candidates: &[String]) -> String {
    if candidates.is_empty() {
        "no start command found".to_string()
    } else {
        format!(
            "{} competing start commands and none under a start/serve key",
            candidates.len()
        )
    }
}

impl StageError for ClassifyError {
    fn reason(&self) -> FailureReason {
        match self {
            ClassifyError::Ambiguous { .. } | ClassifyError::ConflictingLockfiles { .. } => {
                FailureReason::Ambiguous
            }
            ClassifyError::Unrecognized { .. } => FailureReason::Unrecognized,
        }
    }

    fn details(&self) -> Vec<String> {
        match self {
            ClassifyError::Ambiguous { matched, .. } => matched
                .iter()
                .map(|m| format!("matched signature: {}", m))
                .collect(),
            ClassifyError::ConflictingLockfiles { lockfiles, .. } => {
                let mut details: Vec<String> = lockfiles
                    .iter()
                    .map(|(manager, lockfile)| format!("{} lockfile: {}", manager, lockfile))
                    .collect();
                details.push("remove the lockfiles of the package managers you do not use".to_string());
                details
            }
            ClassifyError::Unrecognized { hint } => {
                let mut details = vec![
                    "no dependency manifest or lockfile of a supported build tool was found".to_string(),
                ];
                details.extend(hint.clone());
                details
            }
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no entrypoint: {}", entrypoint_summary(.candidates))]
    NoEntrypoint {
        /// Sources consulted, in order
        checked: Vec<String>,
        candidates: Vec<String>,
    },

    #[error("no Dockerfile template for {language} with {build_system}")]
    NoTemplate {
        language: String,
        build_system: String,
    },
}

impl StageError for ResolveError {
    fn reason(&self) -> FailureReason {
        match self {
            ResolveError::NoEntrypoint { .. } => FailureReason::NoEntrypoint,
            ResolveError::NoTemplate { .. } => FailureReason::NoTemplate,
        }
    }

    fn details(&self) -> Vec<String> {
        match self {
            ResolveError::NoEntrypoint {
                checked,
                candidates,
            } => checked
                .iter()
                .map(|c| format!("checked: {}", c))
                .chain(candidates.iter().map(|c| format!("candidate: {}", c)))
                .collect(),
            ResolveError::NoTemplate { .. } => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("failed to render {artifact}: {message}")]
    TemplateRenderFailure { artifact: String, message: String },
}

impl GenerationError {
    pub fn render(artifact: &str, err: impl fmt::Display) -> Self {
        GenerationError::TemplateRenderFailure {
            artifact: artifact.to_string(),
            message: err.to_string(),
        }
    }
}

impl StageError for GenerationError {
    fn reason(&self) -> FailureReason {
        FailureReason::TemplateRenderFailure
    }
}

/// Structured failure returned instead of a result
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{stage} stage failed ({reason}): {message}")]
pub struct AnalysisFailure {
    pub stage: Stage,
    pub reason: FailureReason,
    pub message: String,
    pub details: Vec<String>,
}

impl AnalysisFailure {
    pub fn from_stage<E: StageError>(stage: Stage, err: &E) -> Self {
        Self {
            stage,
            reason: err.reason(),
            message: err.to_string(),
            details: err.details(),
        }
    }

    pub fn cancelled(stage: Stage) -> Self {
        Self {
            stage,
            reason: FailureReason::Cancelled,
            message: "analysis cancelled".to_string(),
            details: Vec::new(),
        }
    }

    pub fn internal(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            reason: FailureReason::Internal,
            message: message.into(),
            details: Vec::new(),
        }
    }
}
