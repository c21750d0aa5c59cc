//! Entrypoint resolver
//!
//! Start commands are looked up tier by tier: Procfile `web`, the build
//! tool's manifest, the framework convention, then the language's main-file
//! convention. Ports come from the first evidence tier that yields any.

use super::classify::ProjectProfile;
use super::scan::FileManifest;
use crate::output::schema::{Warning, WarningCode};
use crate::pipeline::error::ResolveError;
use crate::stack::manifest::parse_procfile;
use crate::stack::{
    BuildCommands, BuildSystem, CommandCandidate, Framework, LanguageDefinition, StackRegistry,
};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{debug, info};

pub const WORKING_DIR: &str = "/app";

/// Upper bound on source files searched for bind patterns
const MAX_SOURCE_FILES_FOR_PORTS: usize = 200;

const ENV_FILES: &[&str] = &[".env", ".env.example", ".env.sample", ".env.local", ".env.production"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrypointSource {
    Procfile,
    Manifest,
    Framework,
    Convention,
}

#[derive(Debug, Clone, Serialize)]
pub struct Entrypoint {
    pub start_command: String,
    pub working_dir: String,
    /// Ordered, possibly empty
    pub ports: Vec<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    pub source: EntrypointSource,
    /// File the start command was taken from
    pub declared_in: String,
    #[serde(skip)]
    pub commands: BuildCommands,
}

impl Entrypoint {
    pub fn primary_port(&self) -> Option<u16> {
        self.ports.first().copied()
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub entrypoint: Entrypoint,
    pub warnings: Vec<Warning>,
}

pub fn resolve(files: &FileManifest, profile: &ProjectProfile) -> Result<Resolution, ResolveError> {
    let registry = StackRegistry::global();
    let build_system = registry
        .get_build_system(profile.build_system)
        .ok_or_else(|| no_template(profile))?;
    let language = registry
        .get_language(profile.language)
        .ok_or_else(|| no_template(profile))?;
    let framework = profile.framework.and_then(|id| registry.get_framework(id));

    let (candidate, source) = select_start_command(files, profile, build_system, framework, language)?;
    debug!(command = %candidate.command, source = ?source, "Start command selected");

    let mut warnings = Vec::new();
    if source == EntrypointSource::Convention {
        warnings.push(Warning::new(
            WarningCode::ConventionEntrypoint,
            format!(
                "no start command is declared; using `{}` derived from {}",
                candidate.command, candidate.source
            ),
        ));
    }

    let mut ports = detect_ports(files, profile, &candidate, framework, language);
    if ports.is_empty() {
        ports = framework.map(|f| f.default_ports().to_vec()).unwrap_or_default();
    }
    if ports.is_empty() {
        warnings.push(Warning::new(
            WarningCode::MissingPort,
            "no listening port was found and the stack has no conventional default; EXPOSE is omitted",
        ));
    }

    let commands = build_system.commands(&profile.manifest, files);
    let entrypoint = Entrypoint {
        start_command: candidate.command.clone(),
        working_dir: WORKING_DIR.to_string(),
        ports,
        build_command: candidate.build.clone().or_else(|| commands.build.clone()),
        install_command: commands.install.clone(),
        test_command: commands.test.clone(),
        source,
        declared_in: candidate.source.clone(),
        commands,
    };

    info!(
        command = %entrypoint.start_command,
        ports = ?entrypoint.ports,
        "Entrypoint resolved"
    );
    Ok(Resolution {
        entrypoint,
        warnings,
    })
}

fn no_template(profile: &ProjectProfile) -> ResolveError {
    ResolveError::NoTemplate {
        language: profile.language.to_string(),
        build_system: profile.build_system.to_string(),
    }
}

fn select_start_command(
    files: &FileManifest,
    profile: &ProjectProfile,
    build_system: &dyn BuildSystem,
    framework: Option<&dyn Framework>,
    language: &dyn LanguageDefinition,
) -> Result<(CommandCandidate, EntrypointSource), ResolveError> {
    let mut checked = vec!["Procfile".to_string()];

    if let Some(web) = files
        .read("Procfile")
        .and_then(|content| parse_procfile(&content).remove("web"))
    {
        return Ok((
            CommandCandidate::new("web", web, "Procfile"),
            EntrypointSource::Procfile,
        ));
    }

    checked.push(format!("{} manifest", build_system.id()));
    let declared = build_system.declared_commands(&profile.manifest, files);
    if !declared.is_empty() {
        return pick_one(declared, checked).map(|c| (c, EntrypointSource::Manifest));
    }

    if let Some(framework) = framework {
        checked.push(format!("{} convention", framework.id()));
        if let Some(command) = framework.start_command(files, &profile.manifest) {
            let candidate = CommandCandidate::new(framework.id().slug(), command, framework.id().name());
            return Ok((candidate, EntrypointSource::Framework));
        }
    }

    checked.push(format!("{} entry files", language.id()));
    let conventional = language.conventional_commands(files, &profile.manifest);
    if conventional.is_empty() {
        return Err(ResolveError::NoEntrypoint {
            checked,
            candidates: Vec::new(),
        });
    }
    pick_one(conventional, checked).map(|c| (c, EntrypointSource::Convention))
}

/// A lone candidate wins; otherwise the unique lowest canonical rank
fn pick_one(
    mut candidates: Vec<CommandCandidate>,
    checked: Vec<String>,
) -> Result<CommandCandidate, ResolveError> {
    if candidates.len() == 1 {
        return Ok(candidates.remove(0));
    }

    let best = candidates.iter().filter_map(|c| c.canonical_rank).min();
    let at_best: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| best.is_some() && c.canonical_rank == best)
        .map(|(index, _)| index)
        .collect();
    if let [index] = at_best[..] {
        return Ok(candidates.swap_remove(index));
    }

    Err(ResolveError::NoEntrypoint {
        checked,
        candidates: candidates
            .iter()
            .map(|c| format!("{} ({}: {})", c.command, c.source, c.key))
            .collect(),
    })
}

fn command_port_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?:--port|--listen|-p)[= ](\d{2,5})\b",
            r"\bPORT=(\d{2,5})\b",
            r"(?:0\.0\.0\.0|localhost|127\.0\.0\.1|\[::\]):(\d{2,5})\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid port regex"))
        .collect()
    })
}

fn env_port_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?m)^\s*(?:export\s+)?PORT\s*=\s*["']?(\d{2,5})"#).expect("valid env regex")
    })
}

fn expose_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^\s*EXPOSE\s+(.+)$").expect("valid expose regex"))
}

fn captured_ports<'a>(patterns: impl IntoIterator<Item = &'a Regex>, text: &str) -> Vec<u16> {
    patterns
        .into_iter()
        .flat_map(|re| {
            re.captures_iter(text)
                .filter_map(|cap| cap.get(1)?.as_str().parse::<u16>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}

fn detect_ports(
    files: &FileManifest,
    profile: &ProjectProfile,
    candidate: &CommandCandidate,
    framework: Option<&dyn Framework>,
    language: &dyn LanguageDefinition,
) -> Vec<u16> {
    let tiers: [(&str, Box<dyn Fn() -> Vec<u16> + '_>); 4] = [
        ("command", Box::new(|| ports_from_command(profile, candidate))),
        ("manifest", Box::new(|| profile.manifest.declared_ports.clone())),
        ("config", Box::new(|| ports_from_config(files, framework))),
        ("source", Box::new(|| ports_from_sources(files, language))),
    ];

    for (tier, detect) in tiers.iter() {
        let ports = dedup(detect());
        if !ports.is_empty() {
            debug!(tier = %tier, ports = ?ports, "Ports detected");
            return ports;
        }
    }
    Vec::new()
}

/// The command itself plus the script body it invokes
fn ports_from_command(profile: &ProjectProfile, candidate: &CommandCandidate) -> Vec<u16> {
    let mut text = candidate.command.clone();
    if let Some(body) = profile.manifest.script(&candidate.key) {
        text.push('\n');
        text.push_str(body);
    }
    captured_ports(command_port_patterns(), &text)
}

fn ports_from_config(files: &FileManifest, framework: Option<&dyn Framework>) -> Vec<u16> {
    let mut ports: Vec<u16> = ENV_FILES
        .iter()
        .filter_map(|path| files.read(path))
        .flat_map(|content| captured_ports([env_port_regex()], &content))
        .collect();

    if let Some(content) = files.read("Dockerfile") {
        ports.extend(exposed_ports(&content));
    }

    for path in [
        "docker-compose.yml",
        "docker-compose.yaml",
        "compose.yml",
        "compose.yaml",
    ] {
        if let Some(content) = files.read(path) {
            ports.extend(compose_container_ports(&content));
        }
    }

    if let Some(framework) = framework {
        ports.extend(framework.config_ports(files));
    }
    ports
}

pub(crate) fn exposed_ports(dockerfile: &str) -> Vec<u16> {
    expose_regex()
        .captures_iter(dockerfile)
        .filter_map(|cap| cap.get(1))
        .flat_map(|args| {
            args.as_str()
                .split_whitespace()
                .filter_map(|token| token.split('/').next()?.parse::<u16>().ok())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Container-side ports published by any compose service
pub(crate) fn compose_container_ports(compose: &str) -> Vec<u16> {
    let Ok(doc) = serde_yaml::from_str::<serde_yaml::Value>(compose) else {
        return Vec::new();
    };
    let Some(services) = doc.get("services").and_then(|s| s.as_mapping()) else {
        return Vec::new();
    };

    services
        .values()
        .filter_map(|service| service.get("ports")?.as_sequence())
        .flatten()
        .filter_map(|entry| match entry {
            serde_yaml::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            serde_yaml::Value::String(s) => s
                .rsplit(':')
                .next()?
                .split('/')
                .next()?
                .parse::<u16>()
                .ok(),
            serde_yaml::Value::Mapping(m) => m
                .get("target")
                .and_then(|t| t.as_u64())
                .and_then(|p| u16::try_from(p).ok()),
            _ => None,
        })
        .collect()
}

fn ports_from_sources(files: &FileManifest, language: &dyn LanguageDefinition) -> Vec<u16> {
    let patterns: Vec<Regex> = language
        .port_patterns()
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
    if patterns.is_empty() {
        return Vec::new();
    }

    let extensions = language.extensions();
    files
        .source_files()
        .filter(|entry| entry.extension().is_some_and(|ext| extensions.contains(&ext)))
        .take(MAX_SOURCE_FILES_FOR_PORTS)
        .filter_map(|entry| files.read(&entry.path))
        .flat_map(|content| captured_ports(patterns.iter(), &content))
        .collect()
}

fn dedup(ports: Vec<u16>) -> Vec<u16> {
    let mut seen = Vec::with_capacity(ports.len());
    for port in ports {
        if port > 0 && !seen.contains(&port) {
            seen.push(port);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phases::classify::classify;
    use crate::stack::buildsystem::test_support::workspace;

    fn resolve_files(files: &[(&str, &str)]) -> Result<Resolution, ResolveError> {
        let (_t, manifest) = workspace(files);
        let profile = classify(&manifest).unwrap();
        resolve(&manifest, &profile)
    }

    #[test]
    fn test_start_script_with_declared_port() {
        let resolution = resolve_files(&[
            (
                "package.json",
                r#"{"scripts": {"start": "node server.js --port 3000", "test": "jest"}}"#,
            ),
            ("package-lock.json", "{}"),
        ])
        .unwrap();
        let entrypoint = resolution.entrypoint;
        assert_eq!(entrypoint.start_command, "npm start");
        assert_eq!(entrypoint.source, EntrypointSource::Manifest);
        assert_eq!(entrypoint.ports, vec![3000]);
        assert_eq!(entrypoint.install_command.as_deref(), Some("npm ci"));
        assert_eq!(entrypoint.test_command.as_deref(), Some("npm test"));
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_procfile_web_is_authoritative() {
        let resolution = resolve_files(&[
            ("package.json", r#"{"scripts": {"start": "node index.js"}}"#),
            ("Procfile", "web: node cluster.js\nworker: node jobs.js\n"),
        ])
        .unwrap();
        assert_eq!(resolution.entrypoint.start_command, "node cluster.js");
        assert_eq!(resolution.entrypoint.source, EntrypointSource::Procfile);
    }

    #[test]
    fn test_framework_default_port() {
        let resolution = resolve_files(&[
            ("requirements.txt", "flask\n"),
            ("app.py", "from flask import Flask\napp = Flask(__name__)\n"),
        ])
        .unwrap();
        assert_eq!(resolution.entrypoint.source, EntrypointSource::Framework);
        assert_eq!(resolution.entrypoint.ports, vec![5000]);
    }

    #[test]
    fn test_convention_without_port_warns() {
        let resolution = resolve_files(&[("requirements.txt", "requests\n"), ("main.py", "print('hi')\n")])
            .unwrap();
        assert_eq!(resolution.entrypoint.start_command, "python main.py");
        assert!(resolution.entrypoint.ports.is_empty());
        let codes: Vec<_> = resolution.warnings.iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            vec![WarningCode::ConventionEntrypoint, WarningCode::MissingPort]
        );
    }

    #[test]
    fn test_env_file_port_beats_source_patterns() {
        let resolution = resolve_files(&[
            ("package.json", r#"{"main": "server.js"}"#),
            ("server.js", "app.listen(8080)\n"),
            (".env.example", "PORT=4000\n"),
        ])
        .unwrap();
        assert_eq!(resolution.entrypoint.ports, vec![4000]);
    }

    #[test]
    fn test_competing_commands_without_canonical_key() {
        let err = resolve_files(&[
            ("go.mod", "module example.com/tools\n\ngo 1.22\n"),
            ("cmd/migrate/main.go", "package main\n"),
            ("cmd/worker/main.go", "package main\n"),
        ])
        .unwrap_err();
        match err {
            ResolveError::NoEntrypoint { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_entrypoint_lists_checked_sources() {
        let err = resolve_files(&[("requirements.txt", "requests\n"), ("lib/util.py", "")]).unwrap_err();
        match err {
            ResolveError::NoEntrypoint { checked, candidates } => {
                assert!(candidates.is_empty());
                assert_eq!(checked.first().map(String::as_str), Some("Procfile"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compose_and_expose_parsing() {
        let compose = "services:\n  web:\n    ports:\n      - \"8080:3000\"\n      - 9229\n";
        assert_eq!(compose_container_ports(compose), vec![3000, 9229]);
        assert_eq!(exposed_ports("FROM node\nEXPOSE 3000/tcp 9090\n"), vec![3000, 9090]);
    }
}
