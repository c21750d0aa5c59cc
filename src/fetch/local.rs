//! Local directory transport: copies a working tree into the workspace

use super::transport::{Transport, TransportError};
use super::workspace::TreeStats;
use super::{FetchLimits, RepoRef, RepoSource};
use crate::stack::registry::EXCLUDED_DIRS;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copies regular files, skipping VCS metadata and dependency directories
/// the way a fresh clone would not contain them
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

#[async_trait]
impl Transport for LocalTransport {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn retrieve(
        &self,
        repo: &RepoRef,
        dest: &Path,
        limits: &FetchLimits,
    ) -> Result<(), TransportError> {
        let source = match repo.source() {
            RepoSource::Local(path) => path.clone(),
            RepoSource::Remote(url) => {
                return Err(TransportError::Fatal(format!("{} is not a local path", url)))
            }
        };
        let dest = dest.to_path_buf();
        let limits = limits.clone();
        tokio::task::spawn_blocking(move || copy_tree(&source, &dest, &limits))
            .await
            .map_err(|e| TransportError::Fatal(format!("copy task failed: {}", e)))?
    }
}

fn copy_tree(source: &Path, dest: &Path, limits: &FetchLimits) -> Result<(), TransportError> {
    if !source.is_dir() {
        return Err(TransportError::NotFound(format!(
            "{} is not a directory",
            source.display()
        )));
    }
    fs::create_dir_all(dest)?;

    let mut stats = TreeStats::default();
    let walker = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && e.file_name().to_str().is_some_and(|n| EXCLUDED_DIRS.contains(&n)))
        });

    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative: PathBuf = match entry.path().strip_prefix(source) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
            _ => continue,
        };
        let target = dest.join(&relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            stats.files += 1;
            stats.bytes += entry.metadata().map_err(std::io::Error::from)?.len();
            if limits.exceeded_by(&stats) {
                return Err(TransportError::TooLarge {
                    bytes: stats.bytes,
                    files: stats.files,
                });
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copies_tree_without_excluded_dirs() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("src")).unwrap();
        fs::create_dir_all(source.path().join("node_modules/left-pad")).unwrap();
        fs::write(source.path().join("package.json"), "{}").unwrap();
        fs::write(source.path().join("src/index.js"), "").unwrap();
        fs::write(source.path().join("node_modules/left-pad/index.js"), "").unwrap();

        let dest = TempDir::new().unwrap();
        let target = dest.path().join("repo");
        let repo = RepoRef::parse(&source.path().display().to_string()).unwrap();
        LocalTransport
            .retrieve(&repo, &target, &FetchLimits::default())
            .await
            .unwrap();

        assert!(target.join("package.json").exists());
        assert!(target.join("src/index.js").exists());
        assert!(!target.join("node_modules").exists());
    }

    #[tokio::test]
    async fn test_missing_source_is_not_found() {
        let dest = TempDir::new().unwrap();
        let repo = RepoRef::parse("/definitely/not/here").unwrap();
        let err = LocalTransport
            .retrieve(&repo, &dest.path().join("repo"), &FetchLimits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
    }
}
