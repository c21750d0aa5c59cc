//! Go language definition (go modules)

use super::{BaseImage, CiSetup, ImageSet, LanguageDefinition, SizeClass};
use crate::pipeline::phases::scan::FileManifest;
use crate::stack::manifest::ManifestData;
use crate::stack::{BuildSystemId, CommandCandidate, LanguageId};
use std::collections::BTreeSet;

pub struct GoLanguage;

impl GoLanguage {
    fn binary_command(name: &str, package: &str, source: &str) -> CommandCandidate {
        CommandCandidate::new(name, format!("./bin/{}", name), source)
            .with_build(format!("CGO_ENABLED=0 go build -o bin/{} {}", name, package))
    }
}

impl LanguageDefinition for GoLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Go
    }

    fn extensions(&self) -> &[&str] {
        &["go"]
    }

    fn default_version(&self) -> &'static str {
        "1.22"
    }

    fn images(&self, version: &str, _build_system: BuildSystemId) -> ImageSet {
        ImageSet {
            build: BaseImage::new(format!("golang:{}", version), SizeClass::Large),
            single_stage: vec![BaseImage::new(
                format!("golang:{}-alpine", version),
                SizeClass::Medium,
            )],
            runtime: Some(BaseImage::new(
                "gcr.io/distroless/static-debian12",
                SizeClass::Small,
            )),
        }
    }

    /// `main.go` at the root, otherwise one binary per `cmd/<name>/main.go`.
    /// The command named after the module wins among several.
    fn conventional_commands(
        &self,
        files: &FileManifest,
        manifest: &ManifestData,
    ) -> Vec<CommandCandidate> {
        let module_name = manifest
            .name
            .as_deref()
            .and_then(|m| m.rsplit('/').next())
            .filter(|n| !n.is_empty());

        if files.contains("main.go") {
            let name = module_name.unwrap_or("app");
            return vec![Self::binary_command(name, ".", "main.go")];
        }

        let commands: BTreeSet<&str> = files
            .files_in_dir("cmd")
            .filter(|e| e.depth() == 2 && e.file_name() == "main.go")
            .filter_map(|e| e.path.split('/').nth(1))
            .collect();

        commands
            .into_iter()
            .map(|name| {
                let candidate = Self::binary_command(
                    name,
                    &format!("./cmd/{}", name),
                    &format!("cmd/{}/main.go", name),
                );
                if Some(name) == module_name {
                    candidate.with_rank(0)
                } else {
                    candidate
                }
            })
            .collect()
    }

    fn port_patterns(&self) -> &[&str] {
        &[r#"":(\d{2,5})""#, r#"Addr:\s*"[\w.]*:(\d{2,5})""#]
    }

    fn ci_setup(&self, version: &str, _build_system: BuildSystemId) -> CiSetup {
        CiSetup {
            action: "actions/setup-go@v5",
            with: vec![("go-version", version.to_string())],
            image: format!("golang:{}", version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phases::scan::{FileKind, FileManifestEntry};

    fn files(paths: &[&str]) -> FileManifest {
        FileManifest::from_entries(
            "/nonexistent",
            paths
                .iter()
                .map(|p| FileManifestEntry {
                    path: p.to_string(),
                    size: 0,
                    kind: FileKind::detect(p),
                })
                .collect(),
        )
    }

    fn module(name: &str) -> ManifestData {
        ManifestData {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_root_main_uses_module_name() {
        let commands = GoLanguage
            .conventional_commands(&files(&["go.mod", "main.go"]), &module("github.com/acme/api"));
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].command, "./bin/api");
        assert_eq!(
            commands[0].build.as_deref(),
            Some("CGO_ENABLED=0 go build -o bin/api .")
        );
    }

    #[test]
    fn test_cmd_layout_ranks_module_binary() {
        let commands = GoLanguage.conventional_commands(
            &files(&["cmd/api/main.go", "cmd/worker/main.go", "cmd/api/routes.go"]),
            &module("github.com/acme/api"),
        );
        assert_eq!(commands.len(), 2);
        let api = commands.iter().find(|c| c.key == "api").unwrap();
        assert_eq!(api.canonical_rank, Some(0));
        assert_eq!(
            api.build.as_deref(),
            Some("CGO_ENABLED=0 go build -o bin/api ./cmd/api")
        );
        let worker = commands.iter().find(|c| c.key == "worker").unwrap();
        assert_eq!(worker.canonical_rank, None);
    }
}
