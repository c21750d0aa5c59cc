//! Output formatting for multiple formats
//!
//! JSON and YAML serialize the result types directly; the human format is a
//! short summary meant for terminals.

use anyhow::{Context, Result};
use std::fmt::Write;

use crate::output::{GenerationResult, InspectionResult};
use crate::pipeline::error::AnalysisFailure;
use crate::pipeline::phases::classify::ProjectProfile;
use crate::pipeline::phases::entrypoint::Entrypoint;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// `include_artifacts` appends the Dockerfile to the human summary
    pub fn format_generation(&self, result: &GenerationResult, include_artifacts: bool) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(result).context("Failed to serialize result to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(result).context("Failed to serialize result to YAML")
            }
            OutputFormat::Human => Ok(self.generation_human(result, include_artifacts)),
        }
    }

    pub fn format_inspection(&self, result: &InspectionResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("Failed to serialize inspection to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(result).context("Failed to serialize inspection to YAML")
            }
            OutputFormat::Human => {
                let mut out = String::new();
                writeln!(out, "Repository:  {}", result.repository)?;
                write_detection(&mut out, &result.profile, &result.entrypoint)?;
                write_warnings(&mut out, result.warnings.iter().map(|w| w.message.as_str()))?;
                Ok(out)
            }
        }
    }

    pub fn format_failure(&self, failure: &AnalysisFailure) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({ "failure": failure }))
                .context("Failed to serialize failure to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&serde_json::json!({ "failure": failure }))
                .context("Failed to serialize failure to YAML"),
            OutputFormat::Human => {
                let mut out = format!("Error: {}\n", failure);
                for detail in &failure.details {
                    writeln!(out, "  - {}", detail)?;
                }
                Ok(out)
            }
        }
    }

    fn generation_human(&self, result: &GenerationResult, include_artifacts: bool) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = write_generation(&mut out, result, include_artifacts);
        out
    }
}

fn write_generation(out: &mut String, result: &GenerationResult, include_artifacts: bool) -> std::fmt::Result {
    match &result.revision {
        Some(revision) => writeln!(out, "Repository:  {} ({})", result.repository, revision)?,
        None => writeln!(out, "Repository:  {}", result.repository)?,
    }
    write_detection(out, &result.profile, &result.entrypoint)?;
    writeln!(
        out,
        "Template:    {} ({} image, {} instructions)",
        result.selected.label, result.selected.size, result.selected.instruction_count
    )?;
    writeln!(out, "Workflow:    {} ({})", result.workflow.target, result.workflow.path)?;
    writeln!(out, "Fingerprint: {}", result.fingerprint)?;
    if !result.files_collected.is_empty() {
        writeln!(out, "Files:       {}", result.files_collected.join(", "))?;
    }
    write_warnings(out, result.warnings.iter().map(|w| w.message.as_str()))?;
    writeln!(out)?;
    writeln!(out, "{}", result.ci_instructions)?;

    if include_artifacts {
        writeln!(out)?;
        writeln!(out, "--- Dockerfile ---")?;
        write!(out, "{}", result.dockerfile)?;
    }
    Ok(())
}

fn write_detection(out: &mut String, profile: &ProjectProfile, entrypoint: &Entrypoint) -> std::fmt::Result {
    writeln!(out, "Stack:       {}", profile.stack_label())?;
    if let Some(version) = &profile.runtime_version {
        writeln!(out, "Runtime:     {}", version)?;
    }
    if !profile.backing_services.is_empty() {
        let services: Vec<String> = profile.backing_services.iter().map(|s| s.to_string()).collect();
        writeln!(out, "Services:    {}", services.join(", "))?;
    }
    writeln!(out, "Start:       {} ({})", entrypoint.start_command, entrypoint.declared_in)?;
    if entrypoint.ports.is_empty() {
        writeln!(out, "Ports:       none")?;
    } else {
        let ports: Vec<String> = entrypoint.ports.iter().map(u16::to_string).collect();
        writeln!(out, "Ports:       {}", ports.join(", "))?;
    }
    Ok(())
}

fn write_warnings<'a>(out: &mut String, warnings: impl Iterator<Item = &'a str>) -> std::fmt::Result {
    let mut warnings = warnings.peekable();
    if warnings.peek().is_some() {
        writeln!(out, "Warnings:")?;
        for warning in warnings {
            writeln!(out, "  - {}", warning)?;
        }
    }
    Ok(())
}
