//! Analysis request and caller preferences

use crate::fetch::RepoRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// CI runner the workflow file is written for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CiTarget {
    #[default]
    Github,
    Gitlab,
}

impl CiTarget {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "github" | "github-actions" => Some(CiTarget::Github),
            "gitlab" | "gitlab-ci" => Some(CiTarget::Gitlab),
            _ => None,
        }
    }

    /// Path of the workflow file relative to the repository root
    pub fn workflow_path(&self) -> &'static str {
        match self {
            CiTarget::Github => ".github/workflows/ci.yml",
            CiTarget::Gitlab => ".gitlab-ci.yml",
        }
    }
}

impl fmt::Display for CiTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CiTarget::Github => write!(f, "GitHub Actions"),
            CiTarget::Gitlab => write!(f, "GitLab CI"),
        }
    }
}

/// Optional knobs that change what gets generated, never what gets detected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPreferences {
    /// Drop multi-stage candidates
    pub force_single_stage: bool,
    /// Image used for the final stage of every candidate
    pub base_image: Option<String>,
    pub ci_target: CiTarget,
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub repo: RepoRef,
    pub preferences: GenerationPreferences,
}

impl AnalysisRequest {
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            preferences: GenerationPreferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: GenerationPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ci_target_names() {
        assert_eq!(CiTarget::from_name("GitLab"), Some(CiTarget::Gitlab));
        assert_eq!(CiTarget::from_name("jenkins"), None);
        assert_eq!(CiTarget::default().workflow_path(), ".github/workflows/ci.yml");
    }
}
