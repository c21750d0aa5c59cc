//! Fastify framework for JavaScript/TypeScript

use super::{DependencyPattern, Framework, NODE_BUILD_SYSTEMS};
use crate::stack::{BuildSystemId, FrameworkId};

pub struct FastifyFramework;

impl Framework for FastifyFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Fastify
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        NODE_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("fastify")]
    }

    fn default_ports(&self) -> &[u16] {
        &[3000]
    }
}
