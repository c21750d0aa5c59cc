//! Actix Web framework for Rust

use super::{DependencyPattern, Framework};
use crate::stack::{BuildSystemId, FrameworkId};

pub struct ActixFramework;

impl Framework for ActixFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::ActixWeb
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        &[BuildSystemId::Cargo]
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("actix-web")]
    }

    fn default_ports(&self) -> &[u16] {
        &[8080]
    }
}
