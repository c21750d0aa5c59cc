//! Shared logic for the Node package managers

use super::{BuildCommands, StageArtifacts};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::{parse_package_json, ManifestData};
use crate::stack::{canonical_key_rank, CommandCandidate, LanguageId};
use tracing::debug;

/// Script keys accepted as start commands
const START_KEYS: &[&str] = &["start", "serve", "start:prod", "server"];

pub(super) const NODE_IGNORE: &[&str] = &["node_modules", "npm-debug.log*", "coverage", ".next/cache"];

pub(super) fn read_package_json(files: &FileManifest) -> ManifestData {
    let Some(content) = files.read("package.json") else {
        return ManifestData::default();
    };
    match parse_package_json(&content) {
        Ok(data) => data,
        Err(e) => {
            debug!(error = %e, "Ignoring unparsable package.json");
            ManifestData::default()
        }
    }
}

/// True when `packageManager` in package.json names `name`
pub(super) fn package_manager_is(files: &FileManifest, name: &str) -> bool {
    read_package_json(files)
        .package_manager
        .is_some_and(|pm| pm.starts_with(&format!("{}@", name)))
}

/// TypeScript when a tsconfig exists or `.ts` sources outnumber `.js` ones
pub(super) fn node_language(files: &FileManifest) -> LanguageId {
    let ts = files.count_with_extensions(&["ts", "tsx", "mts", "cts"]);
    let js = files.count_with_extensions(&["js", "jsx", "mjs", "cjs"]);
    if files.contains("tsconfig.json") || ts > js {
        LanguageId::TypeScript
    } else {
        LanguageId::JavaScript
    }
}

fn has_real_test_script(manifest: &ManifestData) -> bool {
    manifest
        .script("test")
        .is_some_and(|s| !s.contains("no test specified"))
}

/// `run` renders a script invocation for the package manager
pub(super) fn node_commands(
    install: &str,
    prune: Option<&str>,
    manifest: &ManifestData,
    run: impl Fn(&str) -> String,
) -> BuildCommands {
    BuildCommands {
        install: Some(install.to_string()),
        ci_install: None,
        build: manifest.script("build").map(|_| run("build")),
        test: has_real_test_script(manifest).then(|| run("test")),
        prune: prune.map(String::from),
        install_needs_source: false,
    }
}

pub(super) fn node_declared(
    manifest: &ManifestData,
    run: impl Fn(&str) -> String,
) -> Vec<CommandCandidate> {
    START_KEYS
        .iter()
        .filter(|key| manifest.scripts.contains_key(**key))
        .map(|key| {
            let candidate = CommandCandidate::new(*key, run(key), "package.json");
            match canonical_key_rank(key) {
                Some(rank) => candidate.with_rank(rank),
                None => candidate,
            }
        })
        .collect()
}

/// Multi-stage only pays off when there is a build step to leave behind
pub(super) fn node_stage_artifacts(commands: &BuildCommands) -> Option<StageArtifacts> {
    commands.build.as_ref()?;
    Some(StageArtifacts {
        runtime_env: vec![("NODE_ENV".to_string(), "production".to_string())],
        from_build: vec![("/app".to_string(), "/app".to_string())],
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::buildsystem::test_support::workspace;

    #[test]
    fn test_node_language() {
        let (_t, files) = workspace(&[("package.json", "{}"), ("index.js", "")]);
        assert_eq!(node_language(&files), LanguageId::JavaScript);

        let (_t, files) = workspace(&[("package.json", "{}"), ("tsconfig.json", "{}"), ("index.js", "")]);
        assert_eq!(node_language(&files), LanguageId::TypeScript);

        let (_t, files) = workspace(&[("a.ts", ""), ("b.ts", ""), ("c.js", "")]);
        assert_eq!(node_language(&files), LanguageId::TypeScript);
    }

    #[test]
    fn test_placeholder_test_script_is_ignored() {
        let manifest = parse_package_json(
            r#"{"scripts": {"test": "echo \"Error: no test specified\" && exit 1"}}"#,
        )
        .unwrap();
        let commands = node_commands("npm ci", None, &manifest, |s| format!("npm run {}", s));
        assert_eq!(commands.test, None);
        assert_eq!(commands.build, None);
    }

    #[test]
    fn test_declared_ranks() {
        let manifest = parse_package_json(
            r#"{"scripts": {"serve": "vite preview", "start": "node server.js", "start:prod": "node dist/main"}}"#,
        )
        .unwrap();
        let declared = node_declared(&manifest, |s| format!("npm run {}", s));
        assert_eq!(declared.len(), 3);
        assert_eq!(declared[0].key, "start");
        assert_eq!(declared[0].canonical_rank, Some(0));
        assert_eq!(declared[1].canonical_rank, Some(1));
        assert_eq!(declared[2].canonical_rank, None);
    }
}
