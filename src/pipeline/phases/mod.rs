//! Analysis phases, in pipeline order
//!
//! Every phase is a plain function of the previous phase's output; the
//! orchestrator owns sequencing, cancellation and workspace cleanup.

#[path = "01_scan.rs"]
pub mod scan;
#[path = "02_classify.rs"]
pub mod classify;
#[path = "03_entrypoint.rs"]
pub mod entrypoint;
#[path = "04_template.rs"]
pub mod template;
#[path = "05_optimize.rs"]
pub mod optimize;
#[path = "06_workflow.rs"]
pub mod workflow;
#[path = "07_assemble.rs"]
pub mod assemble;
