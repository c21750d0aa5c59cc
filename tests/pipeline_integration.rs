//! End-to-end analysis of the fixture repositories through the engine

use dockmate::fetch::{FetchLimits, Fetcher, RepoRef};
use dockmate::pipeline::phases::scan::ScanConfig;
use dockmate::pipeline::phases::template::BuildStrategy;
use dockmate::pipeline::{
    AnalysisEngine, AnalysisRequest, CiTarget, FailureReason, GenerationPreferences, Stage,
};
use dockmate::progress::NoOpHandler;
use dockmate::stack::{BackingService, BuildSystemId, FrameworkId, LanguageId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Engine whose workspaces live under `parent` so tests can watch them
fn engine_in(parent: &Path) -> AnalysisEngine {
    let fetcher = Fetcher::new(FetchLimits::default()).with_workspace_dir(parent);
    AnalysisEngine::new(fetcher, ScanConfig::default()).with_progress(Arc::new(NoOpHandler))
}

fn request(name: &str) -> AnalysisRequest {
    let path = fixture(name);
    let repo = RepoRef::parse(path.to_str().unwrap()).unwrap();
    AnalysisRequest::new(repo)
}

fn assert_no_workspaces(parent: &Path) {
    let leftovers: Vec<_> = std::fs::read_dir(parent).unwrap().collect();
    assert!(leftovers.is_empty(), "workspaces left behind: {:?}", leftovers);
}

#[tokio::test]
async fn test_node_lockfile_with_start_script_and_port() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());

    let result = engine.analyze(&request("node-express-pg")).await.unwrap();

    assert_eq!(result.profile.language, LanguageId::JavaScript);
    assert_eq!(result.profile.build_system, BuildSystemId::Npm);
    assert_eq!(result.profile.framework, Some(FrameworkId::Express));
    assert_eq!(result.profile.backing_services, vec![BackingService::Postgres]);
    assert_eq!(result.entrypoint.ports, vec![3000]);

    assert!(result.dockerfile.starts_with("# Generated by dockmate"));
    assert!(result.dockerfile.contains("EXPOSE 3000"));
    assert!(matches!(
        result.selected.strategy,
        BuildStrategy::SingleStage | BuildStrategy::MultiStage
    ));

    assert_eq!(result.workflow.target, CiTarget::Github);
    assert_eq!(result.workflow.path, ".github/workflows/ci.yml");
    assert!(result.workflow.text.contains("npm ci"));
    assert!(result.workflow.text.contains("npm run build"));
    assert!(result.workflow.text.contains("npm test"));

    assert!(result.compose.contains("postgres"));
    assert!(result.report.markdown.contains("orders-api") || result.report.markdown.contains("Express"));
    assert!(!result.ci_instructions.is_empty());

    assert_no_workspaces(parent.path());
}

#[tokio::test]
async fn test_other_stacks_resolve_ports() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());

    let flask = engine.analyze(&request("python-flask")).await.unwrap();
    assert_eq!(flask.profile.framework, Some(FrameworkId::Flask));
    assert_eq!(flask.profile.runtime_version.as_deref(), Some("3.12"));
    assert!(flask.entrypoint.start_command.starts_with("gunicorn"));
    assert_eq!(flask.entrypoint.ports, vec![5000]);

    let gin = engine.analyze(&request("go-gin")).await.unwrap();
    assert_eq!(gin.profile.build_system, BuildSystemId::GoMod);
    assert_eq!(gin.profile.framework, Some(FrameworkId::Gin));
    assert!(gin.dockerfile.contains("EXPOSE 8080"));

    let axum = engine.analyze(&request("rust-axum")).await.unwrap();
    assert_eq!(axum.profile.build_system, BuildSystemId::Cargo);
    assert_eq!(axum.profile.framework, Some(FrameworkId::Axum));
    assert_eq!(axum.entrypoint.ports, vec![3000]);

    assert_no_workspaces(parent.path());
}

#[tokio::test]
async fn test_unrecognized_project_leaves_no_workspace() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());

    let failure = engine.analyze(&request("unrecognized")).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Classifying);
    assert_eq!(failure.reason, FailureReason::Unrecognized);
    assert_no_workspaces(parent.path());
}

#[tokio::test]
async fn test_conflicting_lockfiles_are_ambiguous() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());

    let failure = engine.analyze(&request("ambiguous-lockfiles")).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Classifying);
    assert_eq!(failure.reason, FailureReason::Ambiguous);
    assert!(failure.message.contains("npm"));
    assert!(failure.message.contains("Yarn"));
    assert_no_workspaces(parent.path());
}

#[tokio::test]
async fn test_repeated_runs_are_identical_apart_from_timestamp() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());

    let first = engine.analyze(&request("node-express-pg")).await.unwrap();
    let second = engine.analyze(&request("node-express-pg")).await.unwrap();

    assert_eq!(first.dockerfile, second.dockerfile);
    assert_eq!(first.compose, second.compose);
    assert_eq!(first.workflow.text, second.workflow.text);
    assert_eq!(first.report.markdown, second.report.markdown);
    assert_eq!(first.fingerprint, second.fingerprint);
    assert_eq!(first.files_collected, second.files_collected);
}

#[tokio::test]
async fn test_concurrent_analyses_share_one_engine() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());

    let node = request("node-express-pg");
    let go = request("go-gin");
    let (node, go) = tokio::join!(engine.analyze(&node), engine.analyze(&go));

    assert_eq!(node.unwrap().profile.build_system, BuildSystemId::Npm);
    assert_eq!(go.unwrap().profile.build_system, BuildSystemId::GoMod);
    assert_no_workspaces(parent.path());
}

#[tokio::test]
async fn test_gitlab_target_and_single_stage_preference() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());
    let request = request("node-express-pg").with_preferences(GenerationPreferences {
        force_single_stage: true,
        base_image: None,
        ci_target: CiTarget::Gitlab,
    });

    let result = engine.analyze(&request).await.unwrap();

    assert_eq!(result.selected.strategy, BuildStrategy::SingleStage);
    assert_eq!(result.workflow.target, CiTarget::Gitlab);
    assert_eq!(result.workflow.path, ".gitlab-ci.yml");

    let pipeline: serde_yaml::Value = serde_yaml::from_str(&result.workflow.text).unwrap();
    let stages: Vec<&str> = pipeline["stages"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|s| s.as_str())
        .collect();
    assert_eq!(stages, vec!["install", "build", "publish"]);
}

#[tokio::test]
async fn test_missing_subdirectory_fails_at_fetch() {
    let parent = TempDir::new().unwrap();
    let engine = engine_in(parent.path());
    let path = fixture("node-express-pg");
    let repo = RepoRef::parse(path.to_str().unwrap())
        .unwrap()
        .with_subdirectory("services/missing")
        .unwrap();

    let failure = engine.analyze(&AnalysisRequest::new(repo)).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Fetching);
    assert_eq!(failure.reason, FailureReason::NotFound);
    assert_no_workspaces(parent.path());
}
