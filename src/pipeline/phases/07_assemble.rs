//! Generation stage: template candidates, selection, workflow and rendering
//! folded into one immutable [`GenerationResult`].

use super::classify::ProjectProfile;
use super::entrypoint::Resolution;
use super::optimize::{recommend_ignore_list, select};
use super::scan::FileManifest;
use super::template::build_candidates;
use super::workflow::{synthesize, SynthesisError};
use crate::output::schema::{
    GenerationResult, OptimizationReport, ResultStatus, SelectedTemplate, Warning, WarningCode,
};
use crate::pipeline::error::ResolveError;
use crate::pipeline::request::GenerationPreferences;
use crate::render;
use crate::render::report::ReportInput;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::{debug, info};

const WELL_KNOWN_FILES: &[&str] = &[
    "Procfile",
    ".env.example",
    ".env.sample",
    ".dockerignore",
    ".gitlab-ci.yml",
];

const WORKFLOW_DIR: &str = ".github/workflows";

pub struct GenerationInput<'a> {
    pub files: &'a FileManifest,
    /// Display form of the analysed repository
    pub repository: String,
    pub revision: Option<String>,
    pub profile: ProjectProfile,
    pub resolution: Resolution,
    pub preferences: &'a GenerationPreferences,
}

pub fn generate(input: GenerationInput<'_>) -> Result<GenerationResult, SynthesisError> {
    let GenerationInput {
        files,
        repository,
        revision,
        profile,
        resolution,
        preferences,
    } = input;
    let entrypoint = resolution.entrypoint;

    let mut warnings = profile.warnings();
    if files.is_truncated() {
        warnings.push(Warning::new(
            WarningCode::TruncatedScan,
            format!("file scan stopped after {} files; classification saw a partial tree", files.len()),
        ));
    }
    warnings.extend(resolution.warnings);

    let templates = build_candidates(&profile, &entrypoint, preferences);
    warnings.extend(templates.warnings);

    let selection = select(&templates.candidates).ok_or_else(|| ResolveError::NoTemplate {
        language: profile.language.to_string(),
        build_system: profile.build_system.to_string(),
    })?;
    debug!(
        selected = %selection.selected.label,
        considered = selection.considered,
        "Template selected"
    );

    let workflow = synthesize(&profile, &entrypoint, preferences.ci_target)?;
    warnings.extend(workflow.warnings);

    let ignore_list = recommend_ignore_list(&profile);
    let dockerfile = render::dockerfile::render(&selection.selected, &profile);
    let compose = render::compose::render(&profile, &entrypoint)?;
    let markdown = render::report::render(&ReportInput {
        repository: &repository,
        profile: &profile,
        entrypoint: &entrypoint,
        candidates: &templates.candidates,
        selection: &selection,
        ignore_list: &ignore_list,
        warnings: &warnings,
    });

    let fingerprint = fingerprint(&[
        &dockerfile,
        &compose,
        &workflow.artifact.text,
        &markdown,
    ]);
    let selected = &selection.selected;

    info!(
        template = %selected.label,
        warnings = warnings.len(),
        "Artifacts generated"
    );

    Ok(GenerationResult {
        status: ResultStatus::from_warnings(&warnings),
        files_collected: files_collected(files, &profile),
        selected: SelectedTemplate {
            label: selected.label.clone(),
            base_image: selected.base_image.clone(),
            strategy: selected.strategy,
            size: selected.size,
            instruction_count: selected.instruction_count(),
        },
        report: OptimizationReport {
            candidates_considered: selection.considered,
            decisions: selection.decisions.clone(),
            ignore_list,
            markdown,
        },
        ci_instructions: workflow.instructions,
        workflow: workflow.artifact,
        repository,
        revision,
        profile,
        entrypoint,
        dockerfile,
        compose,
        warnings,
        fingerprint,
        generated_at: Utc::now(),
    })
}

/// SHA-256 over the artifacts, each terminated by a NUL byte
pub fn fingerprint(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn files_collected(files: &FileManifest, profile: &ProjectProfile) -> Vec<String> {
    let mut collected: BTreeSet<String> = profile
        .manifest_paths
        .iter()
        .chain(&profile.lockfiles)
        .chain(&profile.dependency_files)
        .chain(&profile.existing_dockerfile)
        .chain(&profile.existing_compose)
        .cloned()
        .collect();
    collected.extend(
        WELL_KNOWN_FILES
            .iter()
            .filter(|f| files.contains(f))
            .map(|f| f.to_string()),
    );
    if files.files_in_dir(WORKFLOW_DIR).next().is_some() {
        collected.insert(format!("{}/", WORKFLOW_DIR));
    }
    collected.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phases::classify::classify;
    use crate::pipeline::phases::entrypoint::resolve;
    use crate::stack::buildsystem::test_support::workspace;

    const EXPRESS_APP: &[(&str, &str)] = &[
        (
            "package.json",
            r#"{"name": "api", "scripts": {"start": "node server.js --port 3000", "build": "tsc", "test": "jest"},
                "dependencies": {"express": "^4.19.0", "pg": "^8.11.0"}}"#,
        ),
        ("package-lock.json", "{}"),
        ("server.js", "require('express')().listen(3000)"),
        (".env.example", "PORT=3000\n"),
        (".github/workflows/old.yml", "name: old\n"),
    ];

    fn generate_for(files: &[(&str, &str)], preferences: &GenerationPreferences) -> GenerationResult {
        let (_t, manifest) = workspace(files);
        let profile = classify(&manifest).unwrap();
        let resolution = resolve(&manifest, &profile).unwrap();
        generate(GenerationInput {
            files: &manifest,
            repository: "acme/api".to_string(),
            revision: None,
            profile,
            resolution,
            preferences,
        })
        .unwrap()
    }

    #[test]
    fn test_generate_express_bundle() {
        let result = generate_for(EXPRESS_APP, &GenerationPreferences::default());
        assert!(result.dockerfile.contains("EXPOSE 3000"));
        assert!(result.compose.contains("postgres:16-alpine"));
        assert!(result.compose.contains("DATABASE_URL"));
        assert!(result.workflow.text.contains("npm ci"));
        assert!(result.workflow.text.contains("npm run build"));
        assert!(result.report.markdown.contains("## Recommended .dockerignore"));
        assert_eq!(result.fingerprint.len(), 64);
        assert_eq!(
            result.files_collected,
            vec![".env.example", ".github/workflows/", "package-lock.json", "package.json"]
        );
    }

    #[test]
    fn test_generate_is_deterministic_modulo_timestamp() {
        let preferences = GenerationPreferences::default();
        let first = generate_for(EXPRESS_APP, &preferences);
        let second = generate_for(EXPRESS_APP, &preferences);
        assert_eq!(first.dockerfile, second.dockerfile);
        assert_eq!(first.report.markdown, second.report.markdown);
        assert_eq!(first.fingerprint, second.fingerprint);
    }

    #[test]
    fn test_force_single_stage_changes_fingerprint() {
        let multi = generate_for(EXPRESS_APP, &GenerationPreferences::default());
        let single = generate_for(
            EXPRESS_APP,
            &GenerationPreferences {
                force_single_stage: true,
                ..Default::default()
            },
        );
        assert_ne!(multi.fingerprint, single.fingerprint);
        assert_eq!(single.selected.strategy, crate::pipeline::phases::template::BuildStrategy::SingleStage);
    }

    #[test]
    fn test_fingerprint_separates_parts() {
        assert_ne!(fingerprint(&["ab", "c"]), fingerprint(&["a", "bc"]));
    }
}
