//! Repository references
//!
//! A [`RepoRef`] is validated once at construction and immutable afterwards.
//! Remote references go through the git transport, local ones are copied.

use super::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

const REMOTE_SCHEMES: &[&str] = &["https://", "http://", "ssh://", "git://"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum RepoSource {
    Remote(String),
    Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    source: RepoSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subdirectory: Option<String>,
}

impl RepoRef {
    /// Accepts git URLs (`https://`, `ssh://`, `git@host:path`), `file://`
    /// URLs and plain directory paths. `file://` URLs ending in `.git` are
    /// cloned, other `file://` URLs are copied as working trees
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(invalid("repository reference is empty"));
        }
        if input.contains(char::is_whitespace) {
            return Err(invalid(format!("'{}' contains whitespace", input)));
        }

        let source = if let Some(path) = input.strip_prefix("file://") {
            if path.is_empty() {
                return Err(invalid("file:// URL has no path"));
            }
            // A bare repository or a `.git` directory is cloned like any remote
            if path.trim_end_matches('/').ends_with(".git") {
                RepoSource::Remote(input.trim_end_matches('/').to_string())
            } else {
                RepoSource::Local(PathBuf::from(path))
            }
        } else if let Some(scheme) = REMOTE_SCHEMES.iter().find(|s| input.starts_with(**s)) {
            validate_url(input, scheme)?;
            RepoSource::Remote(input.trim_end_matches('/').to_string())
        } else if let Some(rest) = input.strip_prefix("git@") {
            match rest.split_once(':') {
                Some((host, path)) if !host.is_empty() && !path.trim_matches('/').is_empty() => {
                    RepoSource::Remote(input.to_string())
                }
                _ => return Err(invalid(format!("'{}' is not a valid scp-style git URL", input))),
            }
        } else if input.contains("://") {
            return Err(invalid(format!("unsupported URL scheme in '{}'", input)));
        } else {
            RepoSource::Local(PathBuf::from(input))
        };

        Ok(Self {
            source,
            revision: None,
            subdirectory: None,
        })
    }

    /// Branch or tag to fetch instead of the default branch
    pub fn with_revision(mut self, revision: impl Into<String>) -> Result<Self, FetchError> {
        let revision = revision.into();
        if !is_valid_revision(&revision) {
            return Err(invalid(format!("'{}' is not a valid branch or tag name", revision)));
        }
        self.revision = Some(revision);
        Ok(self)
    }

    /// Analyse only this relative directory of the repository
    pub fn with_subdirectory(mut self, subdirectory: impl AsRef<str>) -> Result<Self, FetchError> {
        let raw = subdirectory.as_ref();
        let path = Path::new(raw);
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => {
                    return Err(invalid(format!(
                        "subdirectory '{}' must be relative and stay inside the repository",
                        raw
                    )))
                }
            }
        }
        self.subdirectory = (!parts.is_empty()).then(|| parts.join("/"));
        Ok(self)
    }

    pub fn source(&self) -> &RepoSource {
        &self.source
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn subdirectory(&self) -> Option<&str> {
        self.subdirectory.as_deref()
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.source, RepoSource::Remote(_))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            RepoSource::Remote(url) => write!(f, "{}", url)?,
            RepoSource::Local(path) => write!(f, "{}", path.display())?,
        }
        if let Some(subdirectory) = &self.subdirectory {
            write!(f, "//{}", subdirectory)?;
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> FetchError {
    FetchError::InvalidReference(message.into())
}

fn validate_url(url: &str, scheme: &str) -> Result<(), FetchError> {
    let rest = &url[scheme.len()..];
    let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
    let host = host.rsplit('@').next().unwrap_or(host);
    if host.is_empty() {
        return Err(invalid(format!("'{}' has no host", url)));
    }

    let segments: Vec<&str> = path
        .trim_end_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(invalid(format!("'{}' has no repository path", url)));
    }
    // GitHub repositories are always exactly owner/name
    if host.eq_ignore_ascii_case("github.com") && segments.len() != 2 {
        return Err(invalid(format!(
            "'{}' is not a GitHub repository URL (expected https://github.com/<owner>/<repo>)",
            url
        )));
    }
    if segments.iter().any(|s| *s == "..") {
        return Err(invalid(format!("'{}' contains a parent path segment", url)));
    }
    Ok(())
}

/// Subset of git's ref-name rules that keeps the value safe as an argument
fn is_valid_revision(revision: &str) -> bool {
    !revision.is_empty()
        && !revision.starts_with('-')
        && !revision.starts_with('/')
        && !revision.ends_with('/')
        && !revision.ends_with(".lock")
        && !revision.contains("..")
        && !revision.contains("@{")
        && !revision
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c))
}
