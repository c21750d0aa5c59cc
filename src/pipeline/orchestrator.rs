//! Generation orchestrator
//!
//! Runs one request through `fetch → classify → resolve → generate`, owning
//! the state machine, cancellation at stage boundaries and workspace cleanup.
//! Stages never retry; only the fetcher retries transient transport errors.

use super::error::AnalysisFailure;
use super::phases::assemble::{self, GenerationInput};
use super::phases::classify::{self, ProjectProfile};
use super::phases::entrypoint::{self, Resolution};
use super::phases::scan::{self, FileManifest, ScanConfig};
use super::request::AnalysisRequest;
use super::state::{Stage, StateMachine};
use crate::config::DockmateConfig;
use crate::fetch::{Fetcher, GitTransport, RepoRef, Workspace};
use crate::output::{GenerationResult, InspectionResult};
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Stateless between requests; share one engine across concurrent callers
pub struct AnalysisEngine {
    fetcher: Fetcher,
    scan_config: ScanConfig,
    progress: Arc<dyn ProgressHandler>,
}

impl AnalysisEngine {
    pub fn new(fetcher: Fetcher, scan_config: ScanConfig) -> Self {
        Self {
            fetcher,
            scan_config,
            progress: Arc::new(LoggingHandler),
        }
    }

    pub fn from_config(config: &DockmateConfig) -> Self {
        let mut fetcher = Fetcher::new(config.fetch_limits())
            .with_remote_transport(Arc::new(GitTransport::new(config.git_bin.clone())));
        if let Some(dir) = &config.workspace_dir {
            fetcher = fetcher.with_workspace_dir(dir);
        }
        Self::new(fetcher, config.scan_config())
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = handler;
        self
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<GenerationResult, AnalysisFailure> {
        self.analyze_with_cancel(request, &CancellationToken::new()).await
    }

    pub async fn analyze_with_cancel(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, AnalysisFailure> {
        let mut run = Run::start(self.progress.as_ref(), &request.repo);
        let outcome = self.generate(&mut run, request, cancel).await;
        run.finish(outcome, |result| result.warnings.len())
    }

    /// Fetch, classify and resolve without generating artifacts
    pub async fn inspect(
        &self,
        repo: &RepoRef,
        cancel: &CancellationToken,
    ) -> Result<InspectionResult, AnalysisFailure> {
        let mut run = Run::start(self.progress.as_ref(), repo);
        let outcome = self.inspect_inner(&mut run, repo, cancel).await;
        run.finish(outcome, |result| result.warnings.len())
    }

    async fn generate(
        &self,
        run: &mut Run<'_>,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, AnalysisFailure> {
        let workspace = self.fetch(run, &request.repo, cancel).await?;
        let outcome = async {
            let (files, profile, resolution) = self.detect(run, &workspace, cancel).await?;

            run.enter(Stage::Generating, cancel)?;
            let input_repo = request.repo.to_string();
            let revision = request.repo.revision().map(str::to_string);
            let preferences = request.preferences.clone();
            let result = run_blocking(Stage::Generating, cancel, move || {
                assemble::generate(GenerationInput {
                    files: &files,
                    repository: input_repo,
                    revision,
                    profile,
                    resolution,
                    preferences: &preferences,
                })
            })
            .await?
            .map_err(|e| AnalysisFailure::from_stage(Stage::Generating, &e))?;
            run.stage_done();
            Ok::<_, AnalysisFailure>(result)
        }
        .await;
        release(workspace);
        outcome
    }

    async fn inspect_inner(
        &self,
        run: &mut Run<'_>,
        repo: &RepoRef,
        cancel: &CancellationToken,
    ) -> Result<InspectionResult, AnalysisFailure> {
        let workspace = self.fetch(run, repo, cancel).await?;
        let outcome = self.detect(run, &workspace, cancel).await;
        release(workspace);

        let (_, profile, resolution) = outcome?;
        let mut warnings = profile.warnings();
        warnings.extend(resolution.warnings);
        Ok(InspectionResult {
            repository: repo.to_string(),
            profile,
            entrypoint: resolution.entrypoint,
            warnings,
        })
    }

    async fn fetch(
        &self,
        run: &mut Run<'_>,
        repo: &RepoRef,
        cancel: &CancellationToken,
    ) -> Result<Workspace, AnalysisFailure> {
        run.enter(Stage::Fetching, cancel)?;
        let workspace = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisFailure::cancelled(Stage::Fetching)),
            fetched = self.fetcher.fetch(repo) => {
                fetched.map_err(|e| AnalysisFailure::from_stage(Stage::Fetching, &e))?
            }
        };
        self.progress.on_progress(&ProgressEvent::Fetched {
            bytes: workspace.byte_size(),
            files: workspace.file_count(),
            duration: workspace.fetch_duration(),
        });
        run.stage_done();
        Ok(workspace)
    }

    async fn detect(
        &self,
        run: &mut Run<'_>,
        workspace: &Workspace,
        cancel: &CancellationToken,
    ) -> Result<(FileManifest, ProjectProfile, Resolution), AnalysisFailure> {
        run.enter(Stage::Classifying, cancel)?;
        let root = workspace.root().to_path_buf();
        let scan_config = self.scan_config.clone();
        let (files, profile) = run_blocking(Stage::Classifying, cancel, move || {
            let files = scan::scan(&root, &scan_config)
                .map_err(|e| AnalysisFailure::internal(Stage::Classifying, e.to_string()))?;
            let profile = classify::classify(&files)
                .map_err(|e| AnalysisFailure::from_stage(Stage::Classifying, &e))?;
            Ok::<_, AnalysisFailure>((files, profile))
        })
        .await??;
        run.stage_done();

        run.enter(Stage::Resolving, cancel)?;
        let (files, profile, resolution) = run_blocking(Stage::Resolving, cancel, move || {
            let resolution = entrypoint::resolve(&files, &profile);
            (files, profile, resolution)
        })
        .await?;
        let resolution = resolution.map_err(|e| AnalysisFailure::from_stage(Stage::Resolving, &e))?;
        run.stage_done();

        Ok((files, profile, resolution))
    }
}

/// Runs a CPU-bound stage off the async runtime, abandoning it on cancellation
async fn run_blocking<T, F>(
    stage: Stage,
    cancel: &CancellationToken,
    task: F,
) -> Result<T, AnalysisFailure>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AnalysisFailure::cancelled(stage)),
        joined = handle => joined.map_err(|e| {
            AnalysisFailure::internal(stage, format!("{} stage task failed: {}", stage, e))
        }),
    }
}

fn release(workspace: Workspace) {
    let location = workspace.location().to_path_buf();
    match workspace.cleanup() {
        Ok(()) => debug!(workspace = %location.display(), "Workspace removed"),
        Err(e) => warn!(workspace = %location.display(), error = %e, "Failed to remove workspace"),
    }
}

/// Per-request bookkeeping: state machine, timings and progress events
struct Run<'a> {
    machine: StateMachine,
    progress: &'a dyn ProgressHandler,
    started: Instant,
    stage_started: Instant,
}

impl<'a> Run<'a> {
    fn start(progress: &'a dyn ProgressHandler, repo: &RepoRef) -> Self {
        progress.on_progress(&ProgressEvent::Started {
            repository: repo.to_string(),
        });
        let now = Instant::now();
        Self {
            machine: StateMachine::new(),
            progress,
            started: now,
            stage_started: now,
        }
    }

    /// Enters `stage`, then honours a pending cancellation at the boundary
    fn enter(&mut self, stage: Stage, cancel: &CancellationToken) -> Result<(), AnalysisFailure> {
        self.machine
            .enter(stage)
            .map_err(|e| AnalysisFailure::internal(stage, e.to_string()))?;
        self.stage_started = Instant::now();
        self.progress.on_progress(&ProgressEvent::StageStarted { stage });
        if cancel.is_cancelled() {
            return Err(AnalysisFailure::cancelled(stage));
        }
        Ok(())
    }

    fn stage_done(&self) {
        if let Some(stage) = self.machine.current().stage() {
            self.progress.on_progress(&ProgressEvent::StageComplete {
                stage,
                duration: self.stage_started.elapsed(),
            });
        }
    }

    fn finish<T>(
        mut self,
        outcome: Result<T, AnalysisFailure>,
        warnings: impl Fn(&T) -> usize,
    ) -> Result<T, AnalysisFailure> {
        match outcome {
            Ok(value) => {
                if let Err(e) = self.machine.complete() {
                    return Err(AnalysisFailure::internal(Stage::Generating, e.to_string()));
                }
                self.progress.on_progress(&ProgressEvent::Completed {
                    warnings: warnings(&value),
                    total_time: self.started.elapsed(),
                });
                info!(history = ?self.machine.history(), "Analysis finished");
                Ok(value)
            }
            Err(failure) => {
                if let Err(e) = self.machine.fail(failure.reason) {
                    debug!(error = %e, "State machine already terminal");
                }
                self.progress.on_progress(&ProgressEvent::Failed {
                    stage: failure.stage,
                    reason: failure.reason,
                    message: failure.message.clone(),
                });
                Err(failure)
            }
        }
    }
}
