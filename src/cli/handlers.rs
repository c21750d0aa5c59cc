//! Command handlers returning process exit codes

use super::commands::{DetectArgs, GenerateArgs, LimitArgs, SourceArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::{ConfigError, DockmateConfig};
use crate::fetch::{FetchError, RepoRef};
use crate::output::GenerationResult;
use crate::pipeline::error::AnalysisFailure;
use crate::pipeline::request::{AnalysisRequest, GenerationPreferences};
use crate::pipeline::state::Stage;
use crate::pipeline::AnalysisEngine;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ANALYSIS_FAILED: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;

pub async fn handle_generate(args: &GenerateArgs, quiet: bool) -> i32 {
    let config = match load_config(&args.limits, |config| {
        if let Some(ci) = args.ci {
            config.ci_target = ci;
        }
    }) {
        Ok(config) => config,
        Err(e) => return config_error(&e),
    };
    let formatter = OutputFormatter::new(args.format.into());

    let repo = match parse_repo(&args.source) {
        Ok(repo) => repo,
        Err(failure) => return report_failure(&formatter, &failure),
    };
    let request = AnalysisRequest::new(repo).with_preferences(GenerationPreferences {
        force_single_stage: args.single_stage,
        base_image: args.base_image.clone(),
        ci_target: config.ci_target,
    });

    let engine = AnalysisEngine::from_config(&config);
    let cancel = cancel_on_ctrl_c();
    let result = match engine.analyze_with_cancel(&request, &cancel).await {
        Ok(result) => result,
        Err(failure) => return report_failure(&formatter, &failure),
    };

    if let Some(dir) = &args.output_dir {
        match write_artifacts(dir, &result) {
            Ok(written) => {
                for path in &written {
                    info!(path = %path.display(), "Wrote artifact");
                }
            }
            Err(e) => {
                error!("Failed to write artifacts: {:#}", e);
                eprintln!("Error: {:#}", e);
                return EXIT_ANALYSIS_FAILED;
            }
        }
    }

    if quiet && args.format == super::commands::OutputFormatArg::Human {
        return EXIT_SUCCESS;
    }
    let include_artifacts = args.output_dir.is_none();
    match formatter.format_generation(&result, include_artifacts) {
        Ok(text) => {
            println!("{}", text.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ANALYSIS_FAILED
        }
    }
}

pub async fn handle_detect(args: &DetectArgs, quiet: bool) -> i32 {
    let config = match load_config(&args.limits, |_| {}) {
        Ok(config) => config,
        Err(e) => return config_error(&e),
    };
    let formatter = OutputFormatter::new(args.format.into());

    let repo = match parse_repo(&args.source) {
        Ok(repo) => repo,
        Err(failure) => return report_failure(&formatter, &failure),
    };

    let engine = AnalysisEngine::from_config(&config);
    let cancel = cancel_on_ctrl_c();
    let inspection = match engine.inspect(&repo, &cancel).await {
        Ok(inspection) => inspection,
        Err(failure) => return report_failure(&formatter, &failure),
    };

    if quiet && args.format == super::commands::OutputFormatArg::Human {
        return EXIT_SUCCESS;
    }
    match formatter.format_inspection(&inspection) {
        Ok(text) => {
            println!("{}", text.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ANALYSIS_FAILED
        }
    }
}

fn load_config(
    limits: &LimitArgs,
    customize: impl FnOnce(&mut DockmateConfig),
) -> Result<DockmateConfig, ConfigError> {
    let mut config = DockmateConfig::from_env()?;
    if let Some(max_bytes) = limits.max_bytes {
        config.max_bytes = max_bytes;
    }
    if let Some(max_files) = limits.max_files {
        config.max_files = max_files;
    }
    if let Some(timeout) = limits.timeout {
        config.fetch_timeout_secs = timeout;
    }
    customize(&mut config);
    config.validate()?;
    debug!("{}", config);
    Ok(config)
}

fn config_error(err: &ConfigError) -> i32 {
    error!("{}", err);
    eprintln!("Error: {}", err);
    EXIT_CONFIG_ERROR
}

/// Reference errors are fetch-stage failures, reported like any other
fn parse_repo(source: &SourceArgs) -> Result<RepoRef, AnalysisFailure> {
    let to_failure = |e: FetchError| AnalysisFailure::from_stage(Stage::Fetching, &e);
    let mut repo = RepoRef::parse(&source.repository).map_err(to_failure)?;
    if let Some(revision) = &source.revision {
        repo = repo.with_revision(revision).map_err(to_failure)?;
    }
    if let Some(subdir) = &source.subdir {
        repo = repo.with_subdirectory(subdir).map_err(to_failure)?;
    }
    Ok(repo)
}

fn report_failure(formatter: &OutputFormatter, failure: &AnalysisFailure) -> i32 {
    match formatter.format_failure(failure) {
        Ok(text) if formatter_is_machine(formatter) => println!("{}", text.trim_end()),
        Ok(text) => eprintln!("{}", text.trim_end()),
        Err(_) => eprintln!("Error: {}", failure),
    }
    EXIT_ANALYSIS_FAILED
}

fn formatter_is_machine(formatter: &OutputFormatter) -> bool {
    formatter.format() != OutputFormat::Human
}

/// Cancels the returned token on the first Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, cancelling analysis");
            child.cancel();
        }
    });
    token
}

/// Writes every artifact below `dir`, creating parent directories
pub fn write_artifacts(dir: &Path, result: &GenerationResult) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (relative, contents) in result.artifact_files() {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
