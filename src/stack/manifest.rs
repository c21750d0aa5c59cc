//! Typed manifest parsing
//!
//! Each build system parses its dependency manifest into the same
//! [`ManifestData`] shape so classification, entrypoint resolution and
//! template generation never inspect raw manifest text themselves.
//! Parse failures are reported as `anyhow` errors and callers degrade to an
//! empty manifest.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Normalized view of a dependency manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestData {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Named commands (package.json scripts, composer scripts, Pipfile scripts)
    pub scripts: BTreeMap<String, String>,
    /// Runtime dependencies, normalized names
    pub dependencies: BTreeSet<String>,
    pub dev_dependencies: BTreeSet<String>,
    /// Raw runtime version constraint declared by the manifest
    pub runtime_version: Option<String>,
    /// Executable targets declared by the manifest (Cargo binaries)
    pub binaries: Vec<String>,
    pub default_binary: Option<String>,
    /// Entry file declared by the manifest (package.json `main`)
    pub main: Option<String>,
    /// Ports declared as configuration in the manifest
    pub declared_ports: Vec<u16>,
    /// package.json `packageManager` field
    pub package_manager: Option<String>,
}

impl ManifestData {
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains(name)
    }

    pub fn has_any_dependency(&self, name: &str) -> bool {
        self.dependencies.contains(name) || self.dev_dependencies.contains(name)
    }

    pub fn script(&self, key: &str) -> Option<&str> {
        self.scripts.get(key).map(String::as_str)
    }
}

/// Lowercases and applies PEP 503 style normalization (`_`/`.` become `-`)
pub fn normalize_python_name(name: &str) -> String {
    name.trim().to_lowercase().replace(['_', '.'], "-")
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("valid version regex"))
}

/// Extracts the first dotted version number from a constraint such as
/// `>=18.17.0`, `^3.11` or `go1.22.3`.
pub fn extract_version(raw: &str) -> Option<String> {
    version_regex().find(raw).map(|m| m.as_str().to_string())
}

/// Keeps at most `parts` dot-separated components
pub fn truncate_version(version: &str, parts: usize) -> String {
    version
        .split('.')
        .take(parts.max(1))
        .collect::<Vec<_>>()
        .join(".")
}

fn port_from_value(value: &serde_json::Value) -> Option<u16> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        serde_json::Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }
    .filter(|p| *p > 0)
}

fn json_keys(value: &serde_json::Value) -> BTreeSet<String> {
    value
        .as_object()
        .map(|obj| obj.keys().map(|k| k.to_lowercase()).collect())
        .unwrap_or_default()
}

pub fn parse_package_json(content: &str) -> Result<ManifestData> {
    let package: serde_json::Value =
        serde_json::from_str(content).context("package.json is not valid JSON")?;

    let scripts = package["scripts"]
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let mut declared_ports = Vec::new();
    if let Some(port) = port_from_value(&package["config"]["port"]) {
        declared_ports.push(port);
    }

    Ok(ManifestData {
        name: package["name"].as_str().map(String::from),
        version: package["version"].as_str().map(String::from),
        scripts,
        dependencies: json_keys(&package["dependencies"]),
        dev_dependencies: json_keys(&package["devDependencies"]),
        runtime_version: package["engines"]["node"].as_str().map(String::from),
        main: package["main"].as_str().map(String::from),
        declared_ports,
        package_manager: package["packageManager"].as_str().map(String::from),
        ..Default::default()
    })
}

/// Name portion of a PEP 508 requirement string
fn requirement_name(spec: &str) -> Option<String> {
    let name: String = spec
        .trim()
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(normalize_python_name(&name))
    }
}

pub fn parse_requirements(content: &str) -> ManifestData {
    let dependencies = content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(requirement_name)
        .collect();

    ManifestData {
        dependencies,
        ..Default::default()
    }
}

fn toml_table_keys(value: Option<&toml::Value>) -> BTreeSet<String> {
    value
        .and_then(|v| v.as_table())
        .map(|t| t.keys().map(|k| normalize_python_name(k)).collect())
        .unwrap_or_default()
}

pub fn parse_pyproject(content: &str) -> Result<ManifestData> {
    let value: toml::Value = toml::from_str(content).context("pyproject.toml is not valid TOML")?;
    let mut data = ManifestData::default();

    if let Some(project) = value.get("project") {
        data.name = project.get("name").and_then(|v| v.as_str()).map(String::from);
        data.version = project.get("version").and_then(|v| v.as_str()).map(String::from);
        data.runtime_version = project
            .get("requires-python")
            .and_then(|v| v.as_str())
            .map(String::from);
        if let Some(deps) = project.get("dependencies").and_then(|v| v.as_array()) {
            data.dependencies
                .extend(deps.iter().filter_map(|d| d.as_str()).filter_map(requirement_name));
        }
        if let Some(optional) = project
            .get("optional-dependencies")
            .and_then(|v| v.as_table())
        {
            for deps in optional.values().filter_map(|v| v.as_array()) {
                data.dev_dependencies
                    .extend(deps.iter().filter_map(|d| d.as_str()).filter_map(requirement_name));
            }
        }
    }

    if let Some(poetry) = value.get("tool").and_then(|t| t.get("poetry")) {
        if data.name.is_none() {
            data.name = poetry.get("name").and_then(|v| v.as_str()).map(String::from);
        }
        let mut deps = toml_table_keys(poetry.get("dependencies"));
        if deps.remove("python") && data.runtime_version.is_none() {
            data.runtime_version = poetry
                .get("dependencies")
                .and_then(|d| d.get("python"))
                .and_then(|v| v.as_str())
                .map(String::from);
        }
        data.dependencies.extend(deps);
        data.dev_dependencies
            .extend(toml_table_keys(poetry.get("dev-dependencies")));
        if let Some(groups) = poetry.get("group").and_then(|g| g.as_table()) {
            for group in groups.values() {
                data.dev_dependencies
                    .extend(toml_table_keys(group.get("dependencies")));
            }
        }
    }

    Ok(data)
}

pub fn parse_pipfile(content: &str) -> Result<ManifestData> {
    let value: toml::Value = toml::from_str(content).context("Pipfile is not valid TOML")?;

    let scripts = value
        .get("scripts")
        .and_then(|v| v.as_table())
        .map(|t| {
            t.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(ManifestData {
        scripts,
        dependencies: toml_table_keys(value.get("packages")),
        dev_dependencies: toml_table_keys(value.get("dev-packages")),
        runtime_version: value
            .get("requires")
            .and_then(|r| r.get("python_version").or_else(|| r.get("python_full_version")))
            .and_then(|v| v.as_str())
            .map(String::from),
        ..Default::default()
    })
}

pub fn parse_go_mod(content: &str) -> ManifestData {
    let mut data = ManifestData::default();
    let mut in_require_block = false;
    let mut toolchain = None;

    for line in content.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
            } else if let Some(module) = line.split_whitespace().next() {
                data.dependencies.insert(module.to_string());
            }
            continue;
        }

        if let Some(module) = line.strip_prefix("module ") {
            data.name = Some(module.trim().to_string());
        } else if let Some(version) = line.strip_prefix("go ") {
            data.runtime_version = Some(version.trim().to_string());
        } else if let Some(version) = line.strip_prefix("toolchain ") {
            toolchain = Some(version.trim().trim_start_matches("go").to_string());
        } else if line.starts_with("require (") || line == "require(" {
            in_require_block = true;
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some(module) = rest.split_whitespace().next() {
                data.dependencies.insert(module.to_string());
            }
        }
    }

    if toolchain.is_some() {
        data.runtime_version = toolchain;
    }
    data
}

pub fn parse_cargo_toml(content: &str) -> Result<ManifestData> {
    let value: toml::Value = toml::from_str(content).context("Cargo.toml is not valid TOML")?;
    let package = value.get("package");

    let str_field = |key: &str| {
        package
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    let binaries = value
        .get("bin")
        .and_then(|v| v.as_array())
        .map(|bins| {
            bins.iter()
                .filter_map(|b| b.get("name").and_then(|n| n.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let keys = |section: &str| -> BTreeSet<String> {
        value
            .get(section)
            .and_then(|v| v.as_table())
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default()
    };

    Ok(ManifestData {
        name: str_field("name"),
        version: str_field("version"),
        runtime_version: str_field("rust-version"),
        default_binary: str_field("default-run"),
        binaries,
        dependencies: keys("dependencies"),
        dev_dependencies: keys("dev-dependencies"),
        ..Default::default()
    })
}

pub fn parse_pom(content: &str) -> Result<ManifestData> {
    let doc = roxmltree::Document::parse(content).context("pom.xml is not valid XML")?;
    let project = doc.root_element();
    let mut data = ManifestData::default();

    let child_text = |node: roxmltree::Node, name: &str| -> Option<String> {
        node.children()
            .find(|c| c.is_element() && c.tag_name().name() == name)
            .and_then(|c| c.text())
            .map(|t| t.trim().to_string())
    };

    data.name = child_text(project, "artifactId");
    data.version = child_text(project, "version");

    for node in project.children().filter(|c| c.is_element()) {
        match node.tag_name().name() {
            "parent" => {
                if let (Some(group), Some(artifact)) =
                    (child_text(node, "groupId"), child_text(node, "artifactId"))
                {
                    data.dependencies.insert(format!("{}:{}", group, artifact));
                }
            }
            "properties" => {
                for key in ["java.version", "maven.compiler.release", "maven.compiler.source"] {
                    if data.runtime_version.is_none() {
                        data.runtime_version = child_text(node, key);
                    }
                }
            }
            "dependencies" => {
                for dep in node
                    .children()
                    .filter(|c| c.is_element() && c.tag_name().name() == "dependency")
                {
                    if let (Some(group), Some(artifact)) =
                        (child_text(dep, "groupId"), child_text(dep, "artifactId"))
                    {
                        let coordinate = format!("{}:{}", group, artifact);
                        if child_text(dep, "scope").as_deref() == Some("test") {
                            data.dev_dependencies.insert(coordinate);
                        } else {
                            data.dependencies.insert(coordinate);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(data)
}

fn gradle_dependency_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(implementation|api|compileOnly|runtimeOnly|testImplementation)\s*\(?\s*["']([\w.\-]+):([\w.\-]+)"#,
        )
        .expect("valid gradle dependency regex")
    })
}

fn gradle_plugin_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"id\s*\(?\s*["']([\w.\-]+)["']"#).expect("valid gradle plugin regex")
    })
}

fn gradle_java_version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?:JavaLanguageVersion\.of\(\s*(\d+)\s*\)|sourceCompatibility\s*=\s*['"]?(?:JavaVersion\.VERSION_)?(\d+))"#,
        )
        .expect("valid gradle java version regex")
    })
}

pub fn parse_gradle(content: &str) -> ManifestData {
    let mut data = ManifestData::default();

    for cap in gradle_dependency_regex().captures_iter(content) {
        let coordinate = format!("{}:{}", &cap[2], &cap[3]);
        if &cap[1] == "testImplementation" {
            data.dev_dependencies.insert(coordinate);
        } else {
            data.dependencies.insert(coordinate);
        }
    }

    for cap in gradle_plugin_regex().captures_iter(content) {
        data.dependencies.insert(cap[1].to_string());
    }

    data.runtime_version = gradle_java_version_regex()
        .captures(content)
        .and_then(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| m.as_str().to_string());

    data
}

fn gem_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^\s*gem\s+["']([\w\-]+)["']"#).expect("valid gem regex"))
}

fn gemfile_ruby_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*ruby\s+["']([^"']+)["']"#).expect("valid Gemfile ruby regex")
    })
}

pub fn parse_gemfile(content: &str) -> ManifestData {
    let mut data = ManifestData::default();
    let mut group_depth = 0usize;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("group ") && trimmed.ends_with("do") {
            let is_dev = trimmed.contains(":development") || trimmed.contains(":test");
            group_depth = if is_dev { group_depth + 1 } else { group_depth };
            continue;
        }
        if trimmed == "end" && group_depth > 0 {
            group_depth -= 1;
            continue;
        }

        if let Some(cap) = gem_regex().captures(line) {
            let name = cap[1].to_lowercase();
            if group_depth > 0 {
                data.dev_dependencies.insert(name);
            } else {
                data.dependencies.insert(name);
            }
        } else if let Some(cap) = gemfile_ruby_regex().captures(line) {
            data.runtime_version = Some(cap[1].to_string());
        }
    }

    data
}

pub fn parse_composer_json(content: &str) -> Result<ManifestData> {
    let composer: serde_json::Value =
        serde_json::from_str(content).context("composer.json is not valid JSON")?;

    let requirements = |key: &str| -> BTreeSet<String> {
        json_keys(&composer[key])
            .into_iter()
            .filter(|k| k != "php" && !k.starts_with("ext-"))
            .collect()
    };

    let scripts = composer["scripts"]
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| {
                    let command = match v {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Array(items) => Some(
                            items
                                .iter()
                                .filter_map(|i| i.as_str())
                                .collect::<Vec<_>>()
                                .join(" && "),
                        ),
                        _ => None,
                    }?;
                    Some((k.clone(), command))
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(ManifestData {
        name: composer["name"].as_str().map(String::from),
        scripts,
        dependencies: requirements("require"),
        dev_dependencies: requirements("require-dev"),
        runtime_version: composer["require"]["php"].as_str().map(String::from),
        ..Default::default()
    })
}

/// Parses `name: command` process declarations
pub fn parse_procfile(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let (name, command) = line.split_once(':')?;
            let name = name.trim();
            let command = command.trim();
            if name.is_empty() || command.is_empty() {
                None
            } else {
                Some((name.to_string(), command.to_string()))
            }
        })
        .collect()
}
