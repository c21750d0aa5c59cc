//! Axum framework for Rust

use super::{DependencyPattern, Framework};
use crate::stack::{BuildSystemId, FrameworkId};

pub struct AxumFramework;

impl Framework for AxumFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Axum
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        &[BuildSystemId::Cargo]
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("axum")]
    }

    /// Axum leaves the listener entirely to the application
    fn default_ports(&self) -> &[u16] {
        &[]
    }
}
