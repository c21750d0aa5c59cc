crate::define_id_enum! {
    /// Primary language of an analyzed project
    LanguageId {
        JavaScript => "javascript" : "JavaScript" | "js" | "node",
        TypeScript => "typescript" : "TypeScript" | "ts",
        Python => "python" : "Python",
        Go => "go" : "Go" | "golang",
        Rust => "rust" : "Rust",
        Java => "java" : "Java",
        Ruby => "ruby" : "Ruby",
        Php => "php" : "PHP",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_id_serialization() {
        assert_eq!(
            serde_json::to_string(&LanguageId::TypeScript).unwrap(),
            "\"typescript\""
        );
        let parsed: LanguageId = serde_json::from_str("\"php\"").unwrap();
        assert_eq!(parsed, LanguageId::Php);
    }

    #[test]
    fn test_unknown_language_rejected() {
        let parsed: Result<LanguageId, _> = serde_json::from_str("\"cobol\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_language_aliases() {
        assert_eq!(LanguageId::from_name("golang"), Some(LanguageId::Go));
        assert_eq!(LanguageId::from_name("node"), Some(LanguageId::JavaScript));
        assert_eq!(LanguageId::Php.name(), "PHP");
    }
}
