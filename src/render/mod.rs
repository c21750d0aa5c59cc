//! Pure text renderers
//!
//! Each renderer is a function of already-resolved data with no hidden
//! state, so identical inputs always produce byte-identical artifacts.

pub mod compose;
pub mod dockerfile;
pub mod report;
pub mod workflow;

/// First line of every generated YAML or Dockerfile artifact
pub const GENERATED_HEADER: &str = "# Generated by dockmate";
