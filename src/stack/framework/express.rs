//! Express framework for JavaScript/TypeScript

use super::{DependencyPattern, Framework, NODE_BUILD_SYSTEMS};
use crate::stack::{BuildSystemId, FrameworkId};

pub struct ExpressFramework;

impl Framework for ExpressFramework {
    fn id(&self) -> FrameworkId {
        FrameworkId::Express
    }

    fn compatible_build_systems(&self) -> &[BuildSystemId] {
        NODE_BUILD_SYSTEMS
    }

    fn dependency_patterns(&self) -> &[DependencyPattern] {
        &[DependencyPattern::Exact("express")]
    }

    fn default_ports(&self) -> &[u16] {
        &[3000]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::manifest::parse_package_json;

    #[test]
    fn test_express_matches_runtime_dependency_only() {
        let runtime = parse_package_json(r#"{"dependencies": {"express": "^4"}}"#).unwrap();
        assert!(ExpressFramework.matches_manifest(&runtime));

        let dev_only = parse_package_json(r#"{"devDependencies": {"express": "^4"}}"#).unwrap();
        assert!(!ExpressFramework.matches_manifest(&dev_only));
    }
}
