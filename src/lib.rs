//! dockmate - container and CI scaffolding for source repositories
//!
//! Given a reference to a repository, dockmate performs a sparse, bounded
//! fetch, statically infers the language, build tool, start command and
//! ports, then generates a Dockerfile, a compose file, a CI workflow and a
//! Markdown report of every decision it made.
//!
//! # Example Usage
//!
//! ```no_run
//! use dockmate::{AnalysisEngine, AnalysisRequest, DockmateConfig, RepoRef};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DockmateConfig::from_env()?;
//! let engine = AnalysisEngine::from_config(&config);
//!
//! let repo = RepoRef::parse("https://github.com/acme/api")?.with_revision("main")?;
//! let result = engine.analyze(&AnalysisRequest::new(repo)).await?;
//!
//! println!("{}", result.dockerfile);
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`fetch`]: repository references, transports and per-request workspaces
//! - [`pipeline`]: stage functions, state machine and the orchestrator
//! - [`stack`]: read-only language, build-tool and framework tables
//! - [`render`]: pure renderers for Dockerfile, compose, workflow and report
//! - [`output`]: result types handed to callers

pub mod cli;
pub mod config;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod stack;
pub mod util;

pub use config::{ConfigError, DockmateConfig};
pub use fetch::{FetchError, FetchLimits, Fetcher, RepoRef};
pub use output::{GenerationResult, InspectionResult, ResultStatus, Warning, WarningCode};
pub use pipeline::{
    AnalysisEngine, AnalysisFailure, AnalysisRequest, CiTarget, FailureReason, GenerationPreferences,
    Stage,
};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
