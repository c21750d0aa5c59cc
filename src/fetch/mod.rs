//! Fetcher: bounded retrieval of a repository into a per-request workspace
//!
//! ```text
//! RepoRef ──► transport (git | local) ──► measure ──► Workspace
//!               ▲   transient error
//!               └── retry with backoff, whole fetch under one timeout
//! ```
//!
//! Any failure drops the partially filled workspace, which removes it.

pub mod git;
pub mod local;
pub mod repo_ref;
pub mod transport;
pub mod workspace;

pub use git::GitTransport;
pub use local::LocalTransport;
pub use repo_ref::{RepoRef, RepoSource};
pub use transport::{Transport, TransportError};
pub use workspace::{TreeStats, Workspace};

use crate::pipeline::error::{FailureReason, StageError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchLimits {
    pub max_bytes: u64,
    pub max_files: usize,
    /// Wall-clock bound for the whole fetch, retries included
    pub timeout: Duration,
    /// Transport attempts for transient failures
    pub attempts: u32,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
            max_files: 20_000,
            timeout: Duration::from_secs(120),
            attempts: 3,
        }
    }
}

impl FetchLimits {
    pub fn exceeded_by(&self, stats: &TreeStats) -> bool {
        stats.bytes > self.max_bytes || stats.files > self.max_files
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("repository exceeds fetch limits ({bytes} bytes in {files} files, limits {max_bytes} bytes / {max_files} files)")]
    TooLarge {
        bytes: u64,
        files: usize,
        max_bytes: u64,
        max_files: usize,
    },

    #[error("fetch did not finish within {}s", .timeout.as_secs())]
    Timeout { timeout: Duration },

    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("invalid repository reference: {0}")]
    InvalidReference(String),

    #[error("repository unavailable after {attempts} attempt(s): {message}")]
    Unavailable { attempts: u32, message: String },

    #[error("workspace I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl StageError for FetchError {
    fn reason(&self) -> FailureReason {
        match self {
            FetchError::TooLarge { .. } => FailureReason::TooLarge,
            FetchError::Timeout { .. } => FailureReason::Timeout,
            FetchError::NotFound(_) => FailureReason::NotFound,
            FetchError::AccessDenied(_) => FailureReason::AccessDenied,
            FetchError::InvalidReference(_) => FailureReason::InvalidReference,
            FetchError::Unavailable { .. } | FetchError::Io(_) => FailureReason::Unavailable,
        }
    }

    fn details(&self) -> Vec<String> {
        match self {
            FetchError::TooLarge { .. } => vec![
                "raise DOCKMATE_MAX_BYTES / DOCKMATE_MAX_FILES or analyse a subdirectory".to_string(),
            ],
            FetchError::AccessDenied(_) => {
                vec!["private repositories need credentials configured for git".to_string()]
            }
            _ => Vec::new(),
        }
    }
}

pub struct Fetcher {
    limits: FetchLimits,
    remote: Arc<dyn Transport>,
    local: Arc<dyn Transport>,
    workspace_dir: Option<PathBuf>,
}

impl Fetcher {
    pub fn new(limits: FetchLimits) -> Self {
        Self {
            limits,
            remote: Arc::new(GitTransport::default()),
            local: Arc::new(LocalTransport),
            workspace_dir: None,
        }
    }

    pub fn with_remote_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.remote = transport;
        self
    }

    pub fn with_local_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.local = transport;
        self
    }

    /// Parent directory for workspaces instead of the system temp dir
    pub fn with_workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = Some(dir.into());
        self
    }

    pub fn limits(&self) -> &FetchLimits {
        &self.limits
    }

    pub async fn fetch(&self, repo: &RepoRef) -> Result<Workspace, FetchError> {
        let start = Instant::now();
        let transport = if repo.is_remote() {
            &self.remote
        } else {
            &self.local
        };

        let dir = workspace::allocate(self.workspace_dir.as_deref())?;
        let checkout = dir.path().join(workspace::CHECKOUT_DIR);
        debug!(
            transport = transport.name(),
            workspace = %dir.path().display(),
            "Workspace allocated"
        );

        tokio::time::timeout(
            self.limits.timeout,
            self.retrieve_with_retry(transport.as_ref(), repo, &checkout),
        )
        .await
        .map_err(|_| FetchError::Timeout {
            timeout: self.limits.timeout,
        })??;

        let stats = match workspace::measure(&checkout, &self.limits)? {
            Ok(stats) => stats,
            Err(over) => return Err(self.too_large(over)),
        };

        let root = match repo.subdirectory() {
            Some(sub) => {
                let root = checkout.join(sub);
                if !root.is_dir() {
                    return Err(FetchError::NotFound(format!(
                        "subdirectory '{}' does not exist in {}",
                        sub, repo
                    )));
                }
                root
            }
            None => checkout,
        };

        let duration = start.elapsed();
        info!(
            repo = %repo,
            bytes = stats.bytes,
            files = stats.files,
            elapsed_ms = duration.as_millis(),
            "Repository fetched"
        );
        Ok(Workspace::new(dir, root, stats, duration))
    }

    async fn retrieve_with_retry(
        &self,
        transport: &dyn Transport,
        repo: &RepoRef,
        dest: &std::path::Path,
    ) -> Result<(), FetchError> {
        let attempts = self.limits.attempts.max(1);
        let mut delay = INITIAL_BACKOFF;
        let mut attempt = 1;

        loop {
            match transport.retrieve(repo, dest, &self.limits).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!(attempt, delay_ms = delay.as_millis(), error = %err, "Transient fetch failure, retrying");
                    if dest.exists() {
                        tokio::fs::remove_dir_all(dest).await?;
                    }
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(err) => return Err(self.map_transport_error(err, attempt)),
            }
        }
    }

    fn map_transport_error(&self, err: TransportError, attempts: u32) -> FetchError {
        match err {
            TransportError::NotFound(m) => FetchError::NotFound(m),
            TransportError::AccessDenied(m) => FetchError::AccessDenied(m),
            TransportError::TooLarge { bytes, files } => self.too_large(TreeStats { bytes, files }),
            TransportError::Transient(message) | TransportError::Fatal(message) => {
                FetchError::Unavailable { attempts, message }
            }
            TransportError::Io(e) => FetchError::Io(e),
        }
    }

    fn too_large(&self, stats: TreeStats) -> FetchError {
        FetchError::TooLarge {
            bytes: stats.bytes,
            files: stats.files,
            max_bytes: self.limits.max_bytes,
            max_files: self.limits.max_files,
        }
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchLimits::default())
    }
}
