//! Gin framework for Go

use super::{DependencyPattern, Framework};
use crate::stack::{BuildSystemId, FrameworkId};

pub struct GinFramework;

impl Framework for GinFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Gin
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        &[BuildSystemId::GoMod]
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("github.com/gin-gonic/gin")]
    }

    fn default_ports(&self) -> &[u16] {
        &[8080]
    }
}
