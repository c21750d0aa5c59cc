use super::{FetchLimits, RepoRef};
use async_trait::async_trait;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Retrieves one revision of a repository into an empty directory
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    /// `dest` does not exist yet; the transport creates it.
    async fn retrieve(
        &self,
        repo: &RepoRef,
        dest: &Path,
        limits: &FetchLimits,
    ) -> Result<(), TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Exceeded a limit while retrieving
    #[error("limit exceeded while retrieving ({bytes} bytes, {files} files)")]
    TooLarge { bytes: u64, files: usize },

    /// Network-level failure worth another attempt
    #[error("transient transport failure: {0}")]
    Transient(String),

    #[error("transport failed: {0}")]
    Fatal(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Transient(_))
    }
}
