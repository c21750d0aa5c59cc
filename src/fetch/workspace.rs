//! Per-request workspace
//!
//! The backing directory is a [`TempDir`]: dropping a `Workspace` removes it,
//! so every exit path of an analysis (success, failure, cancellation, panic)
//! leaves nothing on disk.

use super::FetchLimits;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;

const WORKSPACE_PREFIX: &str = "dockmate-";

/// Directory the transport retrieves into, inside the workspace directory
pub(crate) const CHECKOUT_DIR: &str = "repo";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub bytes: u64,
    pub files: usize,
}

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    root: PathBuf,
    stats: TreeStats,
    fetch_duration: Duration,
}

impl Workspace {
    pub(crate) fn new(dir: TempDir, root: PathBuf, stats: TreeStats, fetch_duration: Duration) -> Self {
        Self {
            dir,
            root,
            stats,
            fetch_duration,
        }
    }

    /// Root of the analysed tree (the requested subdirectory, if any)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Top-level directory owned by this workspace
    pub fn location(&self) -> &Path {
        self.dir.path()
    }

    pub fn byte_size(&self) -> u64 {
        self.stats.bytes
    }

    pub fn file_count(&self) -> usize {
        self.stats.files
    }

    pub fn fetch_duration(&self) -> Duration {
        self.fetch_duration
    }

    /// Removes the workspace, reporting I/O errors a plain drop would swallow
    pub fn cleanup(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Creates an empty workspace directory under `parent` or the system temp dir
pub(crate) fn allocate(parent: Option<&Path>) -> io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(WORKSPACE_PREFIX);
    match parent {
        Some(parent) => {
            std::fs::create_dir_all(parent)?;
            builder.tempdir_in(parent)
        }
        None => builder.tempdir(),
    }
}

/// Totals regular files below `root`, skipping `.git`. Stops early with
/// `Err(stats)` as soon as a limit is exceeded.
pub(crate) fn measure(root: &Path, limits: &FetchLimits) -> io::Result<Result<TreeStats, TreeStats>> {
    let mut stats = TreeStats::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        stats.files += 1;
        stats.bytes += entry.metadata().map_err(io::Error::from)?.len();
        if limits.exceeded_by(&stats) {
            return Ok(Err(stats));
        }
    }
    Ok(Ok(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_measure_skips_git_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "hello").unwrap();
        fs::create_dir_all(temp.path().join(".git/objects")).unwrap();
        fs::write(temp.path().join(".git/objects/pack"), vec![0u8; 4096]).unwrap();

        let stats = measure(temp.path(), &FetchLimits::default()).unwrap().unwrap();
        assert_eq!(stats, TreeStats { bytes: 5, files: 1 });
    }

    #[test]
    fn test_measure_stops_at_limit() {
        let temp = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(temp.path().join(format!("{}.txt", i)), "x").unwrap();
        }
        let limits = FetchLimits {
            max_files: 3,
            ..Default::default()
        };
        let over = measure(temp.path(), &limits).unwrap().unwrap_err();
        assert_eq!(over.files, 4);
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let dir = allocate(Some(parent.path())).unwrap();
        let location = dir.path().to_path_buf();
        let workspace = Workspace::new(dir, location.clone(), TreeStats::default(), Duration::ZERO);
        assert!(location.starts_with(parent.path()));
        assert!(location.exists());
        drop(workspace);
        assert!(!location.exists());
    }
}
