//! Echo framework for Go

use super::{DependencyPattern, Framework};
use crate::stack::{BuildSystemId, FrameworkId};

pub struct EchoFramework;

impl Framework for EchoFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Echo
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        &[BuildSystemId::GoMod]
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Prefix("github.com/labstack/echo")]
    }

    fn default_ports(&self) -> &[u16] {
        &[1323]
    }
}
