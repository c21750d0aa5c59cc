//! Classifier
//!
//! Every build system in the registry is matched against the file manifest.
//! A match yields one language-level signature, plus one framework-level
//! signature per framework whose dependencies the parsed manifest declares.
//! Signatures are ranked by specificity (framework first) and then by how
//! many files support them; equal top signatures are reported, never guessed.

use super::scan::FileManifest;
use crate::output::schema::{Warning, WarningCode};
use crate::pipeline::error::ClassifyError;
use crate::stack::{
    BackingService, BuildSystem, BuildSystemId, FrameworkId, LanguageId, ManifestData,
    ManifestRole, StackRegistry,
};
use serde::Serialize;
use std::cmp::Reverse;
use std::time::Instant;
use tracing::{debug, info};

const COMPOSE_FILES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Immutable description of the project, shared by every later stage
#[derive(Debug, Clone, Serialize)]
pub struct ProjectProfile {
    pub language: LanguageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<FrameworkId>,
    pub build_system: BuildSystemId,
    pub package_manager: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    pub manifest_paths: Vec<String>,
    pub lockfiles: Vec<String>,
    /// Files copied ahead of the sources in generated images
    pub dependency_files: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backing_services: Vec<BackingService>,
    /// Files that supported the winning signature
    pub evidence: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_dockerfile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_compose: Option<String>,
    #[serde(skip)]
    pub manifest: ManifestData,
}

impl ProjectProfile {
    pub fn has_lockfile(&self) -> bool {
        !self.lockfiles.is_empty()
    }

    /// Human-readable stack, e.g. `TypeScript / Express / npm`
    pub fn stack_label(&self) -> String {
        match self.framework {
            Some(framework) => format!("{} / {} / {}", self.language, framework, self.build_system),
            None => format!("{} / {}", self.language, self.build_system),
        }
    }

    /// Warnings about artifacts the repository already carries
    pub fn warnings(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if let Some(path) = &self.existing_dockerfile {
            warnings.push(Warning::new(
                WarningCode::ExistingDockerfile,
                format!("repository already contains {}; the generated one does not replace it automatically", path),
            ));
        }
        if let Some(path) = &self.existing_compose {
            warnings.push(Warning::new(
                WarningCode::ExistingCompose,
                format!("repository already contains {}", path),
            ));
        }
        warnings
    }
}

/// One matched entry of the signature table
#[derive(Debug, Clone)]
struct SignatureMatch {
    build_system: BuildSystemId,
    framework: Option<FrameworkId>,
    evidence: Vec<String>,
    support: usize,
}

impl SignatureMatch {
    fn is_framework_level(&self) -> bool {
        self.framework.is_some()
    }

    fn label(&self) -> String {
        match self.framework {
            Some(framework) => format!("{} ({})", framework, self.build_system),
            None => self.build_system.to_string(),
        }
    }

    fn same_rank(&self, other: &SignatureMatch) -> bool {
        self.is_framework_level() == other.is_framework_level() && self.support == other.support
    }
}

pub fn classify(files: &FileManifest) -> Result<ProjectProfile, ClassifyError> {
    let start = Instant::now();
    let registry = StackRegistry::global();

    let mut matches = Vec::new();
    let mut manifests = Vec::new();
    let mut locked = Vec::new();
    for build_system in registry.build_systems() {
        let Some(matched) = build_system.detect(files) else {
            continue;
        };
        let lockfiles = own_lockfiles(build_system, &matched);
        if !lockfiles.is_empty() {
            locked.push((build_system, lockfiles));
        }
        let manifest = build_system.parse_manifest(files);
        matches.extend(signatures_for(registry, build_system, &manifest, &matched, files));
        manifests.push((build_system.id(), manifest));
    }

    if let Some(conflict) = lockfile_conflict(&locked) {
        return Err(conflict);
    }

    // Stable sort keeps registry order among equals
    matches.sort_by_key(|m| (Reverse(m.is_framework_level()), Reverse(m.support)));
    debug!(
        signatures = ?matches.iter().map(|m| format!("{}={}", m.label(), m.support)).collect::<Vec<_>>(),
        "Signature matches"
    );

    let Some(winner) = matches.first() else {
        return Err(ClassifyError::Unrecognized {
            hint: unrecognized_hint(registry, files),
        });
    };

    if let Some(runner_up) = matches.get(1).filter(|m| m.same_rank(winner)) {
        return Err(ClassifyError::Ambiguous {
            candidates: vec![winner.label(), runner_up.label()],
            support: winner.support,
            matched: matches.iter().map(|m| m.label()).collect(),
        });
    }

    let build_system = registry
        .get_build_system(winner.build_system)
        .ok_or(ClassifyError::Unrecognized { hint: None })?;
    let manifest = manifests
        .into_iter()
        .find(|(id, _)| *id == winner.build_system)
        .map(|(_, manifest)| manifest)
        .unwrap_or_default();

    let profile = build_profile(registry, build_system, winner, manifest, files);
    info!(
        stack = %profile.stack_label(),
        version = profile.runtime_version.as_deref().unwrap_or("unknown"),
        support = winner.support,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Project classified"
    );
    Ok(profile)
}

/// Lockfiles among `matched` that belong to `build_system` itself
fn own_lockfiles(build_system: &dyn BuildSystem, matched: &[String]) -> Vec<String> {
    build_system
        .manifest_patterns()
        .iter()
        .filter(|p| p.role == ManifestRole::Lockfile && matched.iter().any(|m| m == p.filename))
        .map(|p| p.filename.to_string())
        .collect()
}

/// Two package managers of one language that both carry their own lockfile
/// conflict no matter how many other files support either of them
fn lockfile_conflict(locked: &[(&dyn BuildSystem, Vec<String>)]) -> Option<ClassifyError> {
    locked.iter().find_map(|(first, _)| {
        let rivals: Vec<_> = locked
            .iter()
            .filter(|(other, _)| other.language() == first.language())
            .collect();
        (rivals.len() > 1).then(|| ClassifyError::ConflictingLockfiles {
            candidates: rivals.iter().map(|(bs, _)| bs.id().to_string()).collect(),
            lockfiles: rivals
                .iter()
                .flat_map(|(bs, lockfiles)| {
                    lockfiles.iter().map(|l| (bs.id().to_string(), l.clone()))
                })
                .collect(),
        })
    })
}

fn signatures_for(
    registry: &StackRegistry,
    build_system: &dyn BuildSystem,
    manifest: &ManifestData,
    matched: &[String],
    files: &FileManifest,
) -> Vec<SignatureMatch> {
    let source_support = source_file_count(registry, build_system, files);
    let mut signatures = vec![SignatureMatch {
        build_system: build_system.id(),
        framework: None,
        evidence: matched.to_vec(),
        support: matched.len() + source_support,
    }];

    for framework in registry.frameworks_for(build_system.id()) {
        if !framework.matches_manifest(manifest) {
            continue;
        }
        let markers: Vec<String> = framework
            .marker_files()
            .iter()
            .filter(|m| files.contains(m))
            .map(|m| m.to_string())
            .collect();
        let mut evidence = matched.to_vec();
        evidence.extend(markers.iter().cloned());
        signatures.push(SignatureMatch {
            build_system: build_system.id(),
            framework: Some(framework.id()),
            support: matched.len() + markers.len() + source_support,
            evidence,
        });
    }
    signatures
}

/// Source files written in the build system's language, or the language it
/// refines to (Node projects count both JavaScript and TypeScript sources)
fn source_file_count(
    registry: &StackRegistry,
    build_system: &dyn BuildSystem,
    files: &FileManifest,
) -> usize {
    let mut extensions: Vec<&str> = Vec::new();
    for language in [build_system.language(), build_system.language_for(files)] {
        if let Some(def) = registry.get_language(language) {
            for ext in def.extensions() {
                if !extensions.contains(ext) {
                    extensions.push(ext);
                }
            }
        }
    }
    files.count_with_extensions(&extensions)
}

fn unrecognized_hint(registry: &StackRegistry, files: &FileManifest) -> Option<String> {
    let (extension, count) = files.dominant_extension()?;
    let hint = match registry.language_for_extension(&extension) {
        Some(language) => format!(
            "found {} .{} files that look like {} but no supported manifest",
            count, extension, language
        ),
        None => format!("most common source extension is .{} ({} files)", extension, count),
    };
    Some(hint)
}

fn build_profile(
    registry: &StackRegistry,
    build_system: &dyn BuildSystem,
    winner: &SignatureMatch,
    manifest: ManifestData,
    files: &FileManifest,
) -> ProjectProfile {
    let language = build_system.language_for(files);
    let runtime_version = registry
        .get_language(language)
        .and_then(|def| def.detect_version(files, &manifest));

    let role_of = |path: &str| {
        build_system
            .manifest_patterns()
            .iter()
            .find(|p| p.filename == path)
            .map(|p| p.role)
    };
    let (lockfiles, manifest_paths): (Vec<String>, Vec<String>) = winner
        .evidence
        .iter()
        .filter(|path| role_of(path).is_some())
        .cloned()
        .partition(|path| role_of(path) == Some(ManifestRole::Lockfile));

    ProjectProfile {
        language,
        framework: winner.framework,
        build_system: build_system.id(),
        package_manager: build_system.package_manager().to_string(),
        runtime_version,
        manifest_paths,
        lockfiles,
        dependency_files: build_system.dependency_files(files),
        backing_services: BackingService::detect(&manifest),
        evidence: winner.evidence.clone(),
        existing_dockerfile: files.first_present(&["Dockerfile"]).map(String::from),
        existing_compose: files.first_present(COMPOSE_FILES).map(String::from),
        manifest,
    }
}
