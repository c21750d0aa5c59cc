crate::define_id_enum! {
    /// Build tool / package manager identifier
    BuildSystemId {
        Npm => "npm" : "npm",
        Yarn => "yarn" : "Yarn",
        Pnpm => "pnpm" : "pnpm",
        Pip => "pip" : "pip",
        Poetry => "poetry" : "Poetry",
        Pipenv => "pipenv" : "Pipenv",
        GoMod => "go-mod" : "go mod",
        Cargo => "cargo" : "Cargo",
        Maven => "maven" : "Maven" | "mvn",
        Gradle => "gradle" : "Gradle",
        Bundler => "bundler" : "Bundler",
        Composer => "composer" : "Composer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_id_serialization() {
        assert_eq!(
            serde_json::to_string(&BuildSystemId::Npm).unwrap(),
            "\"npm\""
        );
        assert_eq!(
            serde_json::to_string(&BuildSystemId::GoMod).unwrap(),
            "\"go-mod\""
        );
    }

    #[test]
    fn test_build_system_id_name() {
        assert_eq!(BuildSystemId::Cargo.name(), "Cargo");
        assert_eq!(BuildSystemId::GoMod.name(), "go mod");
    }

    #[test]
    fn test_from_name_with_aliases() {
        assert_eq!(BuildSystemId::from_name("cargo"), Some(BuildSystemId::Cargo));
        assert_eq!(BuildSystemId::from_name("Cargo"), Some(BuildSystemId::Cargo));
        assert_eq!(BuildSystemId::from_name("go mod"), Some(BuildSystemId::GoMod));
        assert_eq!(BuildSystemId::from_name("go-mod"), Some(BuildSystemId::GoMod));
        assert_eq!(BuildSystemId::from_name("mvn"), Some(BuildSystemId::Maven));
        assert_eq!(BuildSystemId::from_name("bazel"), None);
    }

    #[test]
    fn test_table_order_is_stable() {
        let all = BuildSystemId::all_variants();
        assert_eq!(all.first(), Some(&BuildSystemId::Npm));
        assert_eq!(all.last(), Some(&BuildSystemId::Composer));
    }
}
