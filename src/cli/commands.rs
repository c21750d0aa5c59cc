use crate::pipeline::request::CiTarget;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Containerization and CI scaffolding generator for source repositories
#[derive(Parser, Debug)]
#[command(
    name = "dockmate",
    about = "Generate a Dockerfile, compose file and CI workflow for a repository",
    version,
    author,
    long_about = "dockmate performs a sparse, bounded fetch of a repository, detects its \
                  language, build tool, start command and ports, then generates a Dockerfile, \
                  a docker-compose.yml, a CI workflow and a report explaining every decision."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines on stderr")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate container and CI artifacts",
        long_about = "Fetches the repository, classifies it and writes or prints the generated \
                      Dockerfile, docker-compose.yml, CI workflow and DOCKMATE_REPORT.md.\n\n\
                      Examples:\n  \
                      dockmate generate https://github.com/acme/api\n  \
                      dockmate generate . --output-dir out\n  \
                      dockmate generate https://github.com/acme/mono --subdir services/api --ci gitlab\n  \
                      dockmate generate ./app --single-stage --format json"
    )]
    Generate(GenerateArgs),

    #[command(
        about = "Detect the stack and entrypoint only",
        long_about = "Runs fetch, classification and entrypoint resolution without generating \
                      artifacts.\n\n\
                      Examples:\n  \
                      dockmate detect .\n  \
                      dockmate detect https://github.com/acme/api --revision develop --format yaml"
    )]
    Detect(DetectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(
        value_name = "REPO",
        help = "Git URL (https://, ssh://, git@host:path), file:// URL or local directory"
    )]
    pub repository: String,

    #[arg(short = 'r', long, value_name = "REV", help = "Branch or tag to fetch")]
    pub revision: Option<String>,

    #[arg(long, value_name = "DIR", help = "Analyse only this subdirectory")]
    pub subdir: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LimitArgs {
    #[arg(long, value_name = "BYTES", help = "Maximum repository size to fetch")]
    pub max_bytes: Option<u64>,

    #[arg(long, value_name = "COUNT", help = "Maximum number of files to fetch")]
    pub max_files: Option<usize>,

    #[arg(long, value_name = "SECONDS", help = "Fetch timeout")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, help = "Only emit single-stage Dockerfile candidates")]
    pub single_stage: bool,

    #[arg(long, value_name = "IMAGE", help = "Override the final-stage base image")]
    pub base_image: Option<String>,

    #[arg(long, value_enum, help = "CI workflow target [default: github]")]
    pub ci: Option<CiTarget>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Write the generated files into this directory"
    )]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Human,
    Json,
    Yaml,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
