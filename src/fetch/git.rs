//! Sparse, shallow git retrieval through the `git` executable

use super::transport::{Transport, TransportError};
use super::{FetchLimits, RepoRef, RepoSource};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Directories checked out besides top-level files, which cone mode always includes
pub const SPARSE_DIRS: &[&str] = &[
    "src", "app", "cmd", "lib", "server", "config", "public", "internal", "pkg", "bin", ".github",
];

const NOT_FOUND_MARKERS: &[&str] = &[
    "repository not found",
    "not found",
    "does not exist",
    "does not appear to be a git repository",
    "couldn't find remote ref",
];

const ACCESS_DENIED_MARKERS: &[&str] = &[
    "authentication failed",
    "could not read username",
    "permission denied",
    "access denied",
    "403",
];

const TRANSIENT_MARKERS: &[&str] = &[
    "could not resolve host",
    "connection timed out",
    "connection reset",
    "connection refused",
    "early eof",
    "rpc failed",
    "unexpected disconnect",
    "the remote end hung up",
    "502",
    "503",
    "504",
];

#[derive(Debug, Clone)]
pub struct GitTransport {
    binary: String,
}

impl GitTransport {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    async fn run(&self, mut command: Command) -> Result<(), TransportError> {
        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TransportError::Fatal(format!("git executable '{}' not found", self.binary))
            } else {
                TransportError::Io(e)
            }
        })?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_failure(stderr.trim()))
    }
}

impl Default for GitTransport {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl Transport for GitTransport {
    fn name(&self) -> &'static str {
        "git"
    }

    async fn retrieve(
        &self,
        repo: &RepoRef,
        dest: &Path,
        _limits: &FetchLimits,
    ) -> Result<(), TransportError> {
        let url = match repo.source() {
            RepoSource::Remote(url) => url,
            RepoSource::Local(path) => {
                return Err(TransportError::Fatal(format!(
                    "{} is a local path, not a git remote",
                    path.display()
                )))
            }
        };

        let mut clone = self.command();
        clone.args([
            "clone",
            "--depth",
            "1",
            "--filter=blob:none",
            "--sparse",
            "--single-branch",
        ]);
        if let Some(revision) = repo.revision() {
            clone.arg("--branch").arg(revision);
        }
        clone.arg("--").arg(url).arg(dest);
        debug!(url = %url, revision = ?repo.revision(), "Cloning repository");
        self.run(clone).await?;

        let mut sparse = self.command();
        sparse
            .arg("-C")
            .arg(dest)
            .args(["sparse-checkout", "set"])
            .args(sparse_dirs(repo.subdirectory()));
        self.run(sparse).await
    }
}

pub fn sparse_dirs(subdirectory: Option<&str>) -> Vec<String> {
    let mut dirs: Vec<String> = SPARSE_DIRS.iter().map(|d| d.to_string()).collect();
    if let Some(subdirectory) = subdirectory {
        if !dirs.iter().any(|d| d == subdirectory) {
            dirs.push(subdirectory.to_string());
        }
    }
    dirs
}

/// Maps git's stderr to a transport error
pub fn classify_failure(stderr: &str) -> TransportError {
    let lower = stderr.to_lowercase();
    let message = stderr.lines().last().unwrap_or(stderr).to_string();
    // Transport hiccups can mention "not found" in proxy pages, so check them first
    if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        TransportError::Transient(message)
    } else if ACCESS_DENIED_MARKERS.iter().any(|m| lower.contains(m)) {
        TransportError::AccessDenied(message)
    } else if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
        TransportError::NotFound(message)
    } else {
        TransportError::Fatal(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;
    use yare::parameterized;

    fn git(dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
            .arg("-C")
            .arg(dir)
            .args([
                "-c",
                "user.name=dockmate",
                "-c",
                "user.email=dockmate@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?}: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Two commits; `docs/` is outside the sparse set
    fn origin() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        git(root, &["init", "-q"]);
        git(root, &["config", "uploadpack.allowFilter", "true"]);
        fs::write(root.join("package.json"), r#"{"name": "api"}"#).unwrap();
        git(root, &["add", "."]);
        git(root, &["commit", "-q", "-m", "init"]);

        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("README.md"), "# api\n").unwrap();
        fs::write(root.join("src/index.js"), "require('express')\n").unwrap();
        fs::write(root.join("docs/guide.md"), "# guide\n").unwrap();
        git(root, &["add", "."]);
        git(root, &["commit", "-q", "-m", "sources"]);
        dir
    }

    #[tokio::test]
    async fn test_retrieve_is_shallow_and_sparse() {
        let origin = origin();
        let url = format!("file://{}/.git", origin.path().display());
        let repo = RepoRef::parse(&url).unwrap();
        assert!(repo.is_remote());
        let target = TempDir::new().unwrap();
        let dest = target.path().join("checkout");

        GitTransport::default()
            .retrieve(&repo, &dest, &FetchLimits::default())
            .await
            .unwrap();

        assert!(dest.join("package.json").is_file());
        assert!(dest.join("README.md").is_file());
        assert!(dest.join("src/index.js").is_file());
        assert!(!dest.join("docs").exists());
        assert_eq!(git(&dest, &["rev-list", "--count", "HEAD"]), "1");
    }

    #[tokio::test]
    async fn test_retrieve_missing_branch_is_not_found() {
        let origin = origin();
        let url = format!("file://{}/.git", origin.path().display());
        let repo = RepoRef::parse(&url).unwrap().with_revision("nope").unwrap();
        let target = TempDir::new().unwrap();

        let err = GitTransport::default()
            .retrieve(&repo, &target.path().join("checkout"), &FetchLimits::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::NotFound(_)), "{:?}", err);
    }

    #[parameterized(
        missing_repo = { "remote: Repository not found.\nfatal: repository 'https://github.com/a/b/' not found", "not_found" },
        missing_branch = { "warning: Could not find remote branch nope to clone.\nfatal: Remote branch nope not found in upstream origin", "not_found" },
        auth = { "fatal: could not read Username for 'https://github.com': terminal prompts disabled", "denied" },
        dns = { "fatal: unable to access 'https://x/': Could not resolve host: x", "transient" },
        hangup = { "fatal: the remote end hung up unexpectedly", "transient" },
        other = { "fatal: destination path exists", "fatal" },
    )]
    fn test_classify_failure(stderr: &str, expected: &str) {
        let kind = match classify_failure(stderr) {
            TransportError::NotFound(_) => "not_found",
            TransportError::AccessDenied(_) => "denied",
            TransportError::Transient(_) => "transient",
            TransportError::Fatal(_) => "fatal",
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(kind, expected);
    }

    #[test]
    fn test_sparse_dirs_include_subdirectory() {
        let dirs = sparse_dirs(Some("services/api"));
        assert_eq!(dirs.last().map(String::as_str), Some("services/api"));
        assert_eq!(sparse_dirs(Some("src")).len(), SPARSE_DIRS.len());
    }
}
