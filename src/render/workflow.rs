//! GitHub Actions and GitLab CI renderers
//!
//! Both documents are built from typed structs and serialized with
//! `serde_yaml`, so field order follows declaration order and the output
//! is always valid YAML.

use super::GENERATED_HEADER;
use crate::pipeline::error::GenerationError;
use crate::pipeline::phases::workflow::WorkflowPlan;
use crate::pipeline::request::CiTarget;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

const DEFAULT_BRANCH: &str = "main";
/// GHCR image names must be lowercase; `github.repository` keeps the owner's casing
const GITHUB_IMAGE_ENV: &str = r#"echo "IMAGE=ghcr.io/${GITHUB_REPOSITORY,,}" >> "$GITHUB_ENV""#;
const GITHUB_IMAGE_TAG: &str = "${{ env.IMAGE }}:${{ github.sha }}";
const GITLAB_IMAGE_TAG: &str = "$CI_REGISTRY_IMAGE:$CI_COMMIT_SHORT_SHA";
const DOCKER_IMAGE: &str = "docker:27";
const DOCKER_DIND_IMAGE: &str = "docker:27-dind";

pub fn render(plan: &WorkflowPlan) -> Result<String, GenerationError> {
    let yaml = match plan.target {
        CiTarget::Github => serde_yaml::to_string(&github_workflow(plan)),
        CiTarget::Gitlab => serde_yaml::to_string(&gitlab_pipeline(plan)),
    }
    .map_err(|e| GenerationError::render("workflow", e))?;
    Ok(format!("{}\n{}", GENERATED_HEADER, yaml))
}

#[derive(Debug, Serialize)]
struct GithubWorkflow {
    name: &'static str,
    on: GithubTriggers,
    jobs: GithubJobs,
}

#[derive(Debug, Serialize)]
struct GithubTriggers {
    push: BranchFilter,
    pull_request: BranchFilter,
}

#[derive(Debug, Serialize)]
struct BranchFilter {
    branches: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct GithubJobs {
    build: GithubJob,
    publish: GithubJob,
}

#[derive(Debug, Serialize)]
struct GithubJob {
    #[serde(rename = "runs-on")]
    runs_on: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    needs: Option<&'static str>,
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    condition: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    permissions: BTreeMap<&'static str, &'static str>,
    steps: Vec<GithubStep>,
}

#[derive(Debug, Default, Serialize)]
struct GithubStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    with: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<String>,
}

impl GithubStep {
    fn uses(action: &str) -> Self {
        Self {
            uses: Some(action.to_string()),
            ..Default::default()
        }
    }

    fn run(name: &str, command: String) -> Self {
        Self {
            name: Some(name.to_string()),
            run: Some(command),
            ..Default::default()
        }
    }

    fn with(mut self, pairs: &[(&str, &str)]) -> Self {
        self.with = Some(mapping(pairs.iter().copied()));
        self
    }
}

fn mapping<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Mapping {
    pairs
        .into_iter()
        .map(|(k, v)| (Value::String(k.to_string()), Value::String(v.to_string())))
        .collect()
}

fn github_workflow(plan: &WorkflowPlan) -> GithubWorkflow {
    let mut steps = vec![GithubStep::uses("actions/checkout@v4")];

    let setup_with: Vec<(&str, &str)> = plan
        .setup
        .with
        .iter()
        .map(|(k, v)| (*k, v.as_str()))
        .collect();
    steps.push(GithubStep::uses(plan.setup.action).with(&setup_with));

    if !plan.setup_commands.is_empty() {
        steps.push(GithubStep::run(
            "Prepare toolchain",
            plan.setup_commands.join("\n"),
        ));
    }
    steps.push(GithubStep::run("Install", plan.install.shell()));
    steps.push(GithubStep::run("Build", plan.build.shell()));
    steps.push(GithubStep::run("Test", plan.test.shell()));

    let build = GithubJob {
        runs_on: "ubuntu-latest",
        needs: None,
        condition: None,
        permissions: BTreeMap::new(),
        steps,
    };

    let publish = GithubJob {
        runs_on: "ubuntu-latest",
        needs: Some("build"),
        condition: Some("github.event_name == 'push' && github.ref == 'refs/heads/main'"),
        permissions: BTreeMap::from([("contents", "read"), ("packages", "write")]),
        steps: vec![
            GithubStep::uses("actions/checkout@v4"),
            GithubStep::run("Image name", GITHUB_IMAGE_ENV.to_string()),
            GithubStep::uses("docker/setup-buildx-action@v3"),
            GithubStep::uses("docker/login-action@v3").with(&[
                ("registry", "ghcr.io"),
                ("username", "${{ github.actor }}"),
                ("password", "${{ secrets.GITHUB_TOKEN }}"),
            ]),
            GithubStep::uses("docker/build-push-action@v6").with(&[
                ("context", "."),
                ("push", "true"),
                ("tags", GITHUB_IMAGE_TAG),
            ]),
        ],
    };

    GithubWorkflow {
        name: "CI",
        on: GithubTriggers {
            push: BranchFilter {
                branches: vec![DEFAULT_BRANCH],
            },
            pull_request: BranchFilter {
                branches: vec![DEFAULT_BRANCH],
            },
        },
        jobs: GithubJobs { build, publish },
    }
}

#[derive(Debug, Serialize)]
struct GitlabPipeline {
    stages: Vec<&'static str>,
    install: GitlabJob,
    build: GitlabJob,
    publish: GitlabJob,
}

#[derive(Debug, Default, Serialize)]
struct GitlabJob {
    stage: &'static str,
    image: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    services: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    variables: BTreeMap<&'static str, &'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    needs: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    before_script: Vec<String>,
    script: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifacts: Option<GitlabArtifacts>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rules: Vec<GitlabRule>,
}

#[derive(Debug, Serialize)]
struct GitlabArtifacts {
    paths: Vec<String>,
    expire_in: &'static str,
}

#[derive(Debug, Serialize)]
struct GitlabRule {
    #[serde(rename = "if")]
    condition: &'static str,
}

fn gitlab_pipeline(plan: &WorkflowPlan) -> GitlabPipeline {
    let mut install_script = plan.setup_commands.clone();
    install_script.push(plan.install.shell());

    let install = GitlabJob {
        stage: "install",
        image: plan.job_image.clone(),
        script: install_script.clone(),
        artifacts: (!plan.cache_dirs.is_empty()).then(|| GitlabArtifacts {
            paths: plan.cache_dirs.clone(),
            expire_in: "1 hour",
        }),
        ..Default::default()
    };

    // Without artifacts to hand over the build job installs again
    let before_script = if plan.cache_dirs.is_empty() {
        install_script
    } else {
        plan.setup_commands.clone()
    };
    let build = GitlabJob {
        stage: "build",
        image: plan.job_image.clone(),
        needs: vec!["install"],
        before_script,
        script: vec![plan.build.shell(), plan.test.shell()],
        ..Default::default()
    };

    let publish = GitlabJob {
        stage: "publish",
        image: DOCKER_IMAGE.to_string(),
        services: vec![DOCKER_DIND_IMAGE.to_string()],
        variables: BTreeMap::from([("DOCKER_TLS_CERTDIR", "/certs")]),
        needs: vec!["build"],
        before_script: vec![
            "echo \"$CI_REGISTRY_PASSWORD\" | docker login -u \"$CI_REGISTRY_USER\" --password-stdin \"$CI_REGISTRY\"".to_string(),
        ],
        script: vec![
            format!("docker build -t \"{}\" .", GITLAB_IMAGE_TAG),
            format!("docker push \"{}\"", GITLAB_IMAGE_TAG),
        ],
        rules: vec![GitlabRule {
            condition: "$CI_COMMIT_BRANCH == $CI_DEFAULT_BRANCH",
        }],
        ..Default::default()
    };

    GitlabPipeline {
        stages: vec!["install", "build", "publish"],
        install,
        build,
        publish,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phases::workflow::StepCommand;
    use crate::stack::CiSetup;

    fn plan(target: CiTarget, cache_dirs: &[&str]) -> WorkflowPlan {
        WorkflowPlan {
            target,
            setup: CiSetup {
                action: "actions/setup-python@v5",
                with: vec![("python-version", "3.12".to_string())],
                image: "python:3.12".to_string(),
            },
            job_image: "python:3.12".to_string(),
            setup_commands: vec!["pip install poetry".to_string()],
            install: StepCommand::Run("poetry install".to_string()),
            build: StepCommand::Skip("no build step for Python with Poetry".to_string()),
            test: StepCommand::Run("poetry run pytest".to_string()),
            cache_dirs: cache_dirs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_github_workflow_structure() {
        let text = render(&plan(CiTarget::Github, &[])).unwrap();
        assert!(text.starts_with(GENERATED_HEADER));

        let doc: Value = serde_yaml::from_str(&text).unwrap();
        let build_steps = doc["jobs"]["build"]["steps"].as_sequence().unwrap();
        assert_eq!(build_steps[0]["uses"], "actions/checkout@v4");
        assert_eq!(build_steps[1]["with"]["python-version"], "3.12");
        assert_eq!(build_steps[2]["run"], "pip install poetry");
        assert_eq!(
            build_steps[4]["run"],
            "echo \"Skipping: no build step for Python with Poetry\""
        );
        assert_eq!(doc["jobs"]["publish"]["needs"], "build");
        assert_eq!(doc["jobs"]["publish"]["permissions"]["packages"], "write");

        let publish_steps = doc["jobs"]["publish"]["steps"].as_sequence().unwrap();
        assert_eq!(
            publish_steps[1]["run"],
            "echo \"IMAGE=ghcr.io/${GITHUB_REPOSITORY,,}\" >> \"$GITHUB_ENV\""
        );
        assert_eq!(publish_steps[4]["with"]["tags"], "${{ env.IMAGE }}:${{ github.sha }}");
        assert!(!text.contains("${{ github.repository }}"));
    }

    #[test]
    fn test_gitlab_pipeline_reinstalls_without_artifacts() {
        let doc: Value = serde_yaml::from_str(&render(&plan(CiTarget::Gitlab, &[])).unwrap()).unwrap();
        assert!(doc["install"]["artifacts"].is_null());
        let before = doc["build"]["before_script"].as_sequence().unwrap();
        assert_eq!(before.len(), 2);
        assert_eq!(before[1], "poetry install");
        assert_eq!(doc["publish"]["services"][0], DOCKER_DIND_IMAGE);
    }

    #[test]
    fn test_gitlab_pipeline_hands_over_cache_dirs() {
        let doc: Value =
            serde_yaml::from_str(&render(&plan(CiTarget::Gitlab, &[".venv"])).unwrap()).unwrap();
        assert_eq!(doc["install"]["artifacts"]["paths"][0], ".venv");
        assert_eq!(doc["build"]["before_script"].as_sequence().unwrap().len(), 1);
        assert_eq!(doc["stages"].as_sequence().unwrap().len(), 3);
    }
}
