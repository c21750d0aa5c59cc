//! Analysis pipeline: request types, stage errors, state machine and the
//! orchestrator that drives the phases in [`phases`].

pub mod error;
pub mod orchestrator;
pub mod phases;
pub mod request;
pub mod state;

pub use error::{AnalysisFailure, FailureReason, StageError};
pub use orchestrator::AnalysisEngine;
pub use request::{AnalysisRequest, CiTarget, GenerationPreferences};
pub use state::{PipelineState, Stage, StateMachine};
