use crate::stack::registry::EXCLUDED_DIRS;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Files larger than this are listed but never read into memory
pub const DEFAULT_MAX_READ_BYTES: u64 = 1024 * 1024;

const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "npm-shrinkwrap.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Pipfile.lock",
    "go.sum",
    "Cargo.lock",
    "gradle.lockfile",
    "Gemfile.lock",
    "composer.lock",
];

const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "py", "go", "rs", "java", "kt", "rb",
    "php",
];

const CONFIG_EXTENSIONS: &[&str] = &[
    "json", "yaml", "yml", "toml", "xml", "ini", "cfg", "conf", "properties", "env", "gradle",
    "kts", "lock",
];

const CONFIG_NAMES: &[&str] = &[
    "Dockerfile",
    "Procfile",
    "Makefile",
    "Gemfile",
    "Pipfile",
    "Rakefile",
    "config.ru",
    "requirements.txt",
    "runtime.txt",
    "go.mod",
    "gradlew",
    "artisan",
    ".nvmrc",
    ".node-version",
    ".python-version",
    ".ruby-version",
    "rust-toolchain",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Source,
    Config,
    Asset,
    Lockfile,
}

impl FileKind {
    pub fn detect(path: &str) -> Self {
        let file_name = path.rsplit('/').next().unwrap_or(path);

        if LOCKFILES.contains(&file_name) {
            return FileKind::Lockfile;
        }
        if CONFIG_NAMES.contains(&file_name)
            || file_name.starts_with(".env")
            || file_name.starts_with("Dockerfile")
            || file_name.starts_with("requirements")
        {
            return FileKind::Config;
        }

        match file_name.rsplit_once('.').map(|(_, ext)| ext) {
            Some(ext) if SOURCE_EXTENSIONS.contains(&ext) => FileKind::Source,
            Some(ext) if CONFIG_EXTENSIONS.contains(&ext) => FileKind::Config,
            _ => FileKind::Asset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifestEntry {
    /// Path relative to the workspace root, `/`-separated
    pub path: String,
    pub size: u64,
    pub kind: FileKind,
}

impl FileManifestEntry {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn extension(&self) -> Option<&str> {
        self.file_name().rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub max_files: usize,
    pub max_read_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_files: 20_000,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("workspace root {path} is not a readable directory")]
    InvalidRoot { path: PathBuf },
}

/// Read-only listing of a workspace, sorted by path
#[derive(Debug, Clone)]
pub struct FileManifest {
    root: PathBuf,
    entries: Vec<FileManifestEntry>,
    max_read_bytes: u64,
    truncated: bool,
}

impl FileManifest {
    /// Builds a manifest from in-memory entries rooted at `root`
    pub fn from_entries(root: impl Into<PathBuf>, mut entries: Vec<FileManifestEntry>) -> Self {
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup_by(|a, b| a.path == b.path);
        Self {
            root: root.into(),
            entries,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
            truncated: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[FileManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn get(&self, path: &str) -> Option<&FileManifestEntry> {
        self.entries
            .binary_search_by(|e| e.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Returns the first of `paths` present in the manifest
    pub fn first_present<'a>(&self, paths: &[&'a str]) -> Option<&'a str> {
        paths.iter().copied().find(|p| self.contains(p))
    }

    /// Reads a listed file as UTF-8. Unlisted, oversized or unreadable files yield `None`.
    pub fn read(&self, path: &str) -> Option<String> {
        let entry = self.get(path)?;
        if entry.size > self.max_read_bytes {
            debug!(path, size = entry.size, "Skipping oversized file");
            return None;
        }
        std::fs::read_to_string(self.root.join(path)).ok()
    }

    pub fn find_by_name(&self, file_name: &str) -> Vec<&FileManifestEntry> {
        self.entries
            .iter()
            .filter(|e| e.file_name() == file_name)
            .collect()
    }

    pub fn files_in_dir<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = &'a FileManifestEntry> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.entries
            .iter()
            .filter(move |e| e.path.starts_with(&prefix))
    }

    pub fn source_files(&self) -> impl Iterator<Item = &FileManifestEntry> {
        self.entries.iter().filter(|e| e.kind == FileKind::Source)
    }

    pub fn count_with_extensions(&self, extensions: &[&str]) -> usize {
        self.source_files()
            .filter(|e| e.extension().is_some_and(|ext| extensions.contains(&ext)))
            .count()
    }

    /// Most frequent source extension, ties broken alphabetically
    pub fn dominant_extension(&self) -> Option<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for ext in self.source_files().filter_map(|e| e.extension()) {
            *counts.entry(ext).or_default() += 1;
        }
        counts
            .into_iter()
            .fold(None, |best: Option<(&str, usize)>, (ext, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((ext, count)),
            })
            .map(|(ext, count)| (ext.to_string(), count))
    }
}

/// Walks the workspace and lists every file below the configured depth,
/// skipping dependency and build output directories.
pub fn scan(root: &Path, config: &ScanConfig) -> Result<FileManifest, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::InvalidRoot {
            path: root.to_path_buf(),
        });
    }

    let start = Instant::now();
    let mut entries = Vec::new();
    let mut truncated = false;

    let walker = WalkBuilder::new(root)
        .max_depth(Some(config.max_depth))
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && entry.depth() > 0 && is_excluded_dir(&entry.file_name().to_string_lossy()))
        })
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Failed to read directory entry");
                continue;
            }
        };

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        if entries.len() >= config.max_files {
            warn!(
                max_files = config.max_files,
                "Reached file limit, stopping scan"
            );
            truncated = true;
            break;
        }

        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            continue;
        };
        let path = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

        entries.push(FileManifestEntry {
            kind: FileKind::detect(&path),
            path,
            size,
        });
    }

    let mut manifest = FileManifest::from_entries(root, entries);
    manifest.max_read_bytes = config.max_read_bytes;
    manifest.truncated = truncated;

    info!(
        files = manifest.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Workspace scan completed"
    );

    Ok(manifest)
}

/// Hidden directories are skipped except `.github`
fn is_excluded_dir(name: &str) -> bool {
    EXCLUDED_DIRS.contains(&name) || (name.starts_with('.') && name != ".github")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, path: &str, content: &str) {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_file_kind_detection() {
        assert_eq!(FileKind::detect("src/index.ts"), FileKind::Source);
        assert_eq!(FileKind::detect("package-lock.json"), FileKind::Lockfile);
        assert_eq!(FileKind::detect("package.json"), FileKind::Config);
        assert_eq!(FileKind::detect("Dockerfile.dev"), FileKind::Config);
        assert_eq!(FileKind::detect(".env.example"), FileKind::Config);
        assert_eq!(FileKind::detect("requirements-dev.txt"), FileKind::Config);
        assert_eq!(FileKind::detect("public/logo.png"), FileKind::Asset);
        assert_eq!(FileKind::detect("README.md"), FileKind::Asset);
    }

    #[test]
    fn test_scan_lists_sorted_relative_paths() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{}");
        write(temp.path(), "src/server.js", "");
        write(temp.path(), "src/routes/users.js", "");
        write(temp.path(), ".github/workflows/ci.yml", "");

        let manifest = scan(temp.path(), &ScanConfig::default()).unwrap();
        let paths: Vec<_> = manifest.entries().iter().map(|e| e.path.as_str()).collect();

        assert_eq!(
            paths,
            vec![
                ".github/workflows/ci.yml",
                "package.json",
                "src/routes/users.js",
                "src/server.js"
            ]
        );
        assert!(manifest.contains("src/server.js"));
        assert_eq!(manifest.count_with_extensions(&["js"]), 2);
    }

    #[test]
    fn test_scan_skips_dependency_and_hidden_dirs() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "main.py", "");
        write(temp.path(), "node_modules/express/index.js", "");
        write(temp.path(), ".venv/lib/site.py", "");
        write(temp.path(), "target/debug/app", "");
        write(temp.path(), ".env", "PORT=8000");

        let manifest = scan(temp.path(), &ScanConfig::default()).unwrap();
        let paths: Vec<_> = manifest.entries().iter().map(|e| e.path.as_str()).collect();

        assert_eq!(paths, vec![".env", "main.py"]);
    }

    #[test]
    fn test_scan_respects_depth_and_file_limit() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/b/c/deep.go", "");
        write(temp.path(), "one.go", "");
        write(temp.path(), "two.go", "");

        let shallow = ScanConfig {
            max_depth: 2,
            ..ScanConfig::default()
        };
        let manifest = scan(temp.path(), &shallow).unwrap();
        assert!(!manifest.contains("a/b/c/deep.go"));

        let limited = ScanConfig {
            max_files: 1,
            ..ScanConfig::default()
        };
        let manifest = scan(temp.path(), &limited).unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.is_truncated());
    }

    #[test]
    fn test_read_and_dominant_extension() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "go.mod", "module x");
        write(temp.path(), "main.go", "package main");
        write(temp.path(), "util.go", "package main");
        write(temp.path(), "script.py", "");

        let manifest = scan(temp.path(), &ScanConfig::default()).unwrap();
        assert_eq!(manifest.read("go.mod").as_deref(), Some("module x"));
        assert_eq!(manifest.read("missing.txt"), None);
        assert_eq!(manifest.dominant_extension(), Some(("go".to_string(), 2)));
    }

    #[test]
    fn test_scan_invalid_root() {
        let result = scan(Path::new("/nonexistent/dockmate-root"), &ScanConfig::default());
        assert!(matches!(result, Err(ScanError::InvalidRoot { .. })));
    }
}
