pub mod schema;

pub use schema::{
    GenerationResult, InspectionResult, OptimizationReport, ResultStatus, SelectedTemplate,
    Warning, WarningCode, WorkflowArtifact,
};
