//! Markdown report explaining what was detected and why a template won

use crate::output::schema::Warning;
use crate::pipeline::phases::classify::ProjectProfile;
use crate::pipeline::phases::entrypoint::Entrypoint;
use crate::pipeline::phases::optimize::Selection;
use crate::pipeline::phases::template::TemplateCandidate;
use std::fmt::Write;

pub struct ReportInput<'a> {
    pub repository: &'a str,
    pub profile: &'a ProjectProfile,
    pub entrypoint: &'a Entrypoint,
    pub candidates: &'a [TemplateCandidate],
    pub selection: &'a Selection,
    pub ignore_list: &'a [String],
    pub warnings: &'a [Warning],
}

pub fn render(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, input);
    out
}

fn write_report(out: &mut String, input: &ReportInput<'_>) -> std::fmt::Result {
    let profile = input.profile;
    let entrypoint = input.entrypoint;

    writeln!(out, "# dockmate report for {}", input.repository)?;
    writeln!(out)?;

    writeln!(out, "## Detected stack")?;
    writeln!(out)?;
    writeln!(out, "| Property | Value |")?;
    writeln!(out, "|---|---|")?;
    writeln!(
        out,
        "| Language | {}{} |",
        profile.language,
        profile
            .runtime_version
            .as_deref()
            .map(|v| format!(" {}", v))
            .unwrap_or_default()
    )?;
    if let Some(framework) = profile.framework {
        writeln!(out, "| Framework | {} |", framework)?;
    }
    writeln!(out, "| Build system | {} |", profile.build_system)?;
    writeln!(out, "| Manifests | {} |", code_list(&profile.manifest_paths))?;
    writeln!(out, "| Lockfiles | {} |", code_list(&profile.lockfiles))?;
    if !profile.backing_services.is_empty() {
        let services: Vec<String> = profile.backing_services.iter().map(|s| s.to_string()).collect();
        writeln!(out, "| Backing services | {} |", services.join(", "))?;
    }
    writeln!(out)?;

    writeln!(out, "## Entrypoint")?;
    writeln!(out)?;
    writeln!(
        out,
        "- Start: `{}` (from `{}`)",
        entrypoint.start_command, entrypoint.declared_in
    )?;
    writeln!(out, "- Working directory: `{}`", entrypoint.working_dir)?;
    if entrypoint.ports.is_empty() {
        writeln!(out, "- Ports: none detected")?;
    } else {
        let ports: Vec<String> = entrypoint.ports.iter().map(u16::to_string).collect();
        writeln!(out, "- Ports: {}", ports.join(", "))?;
    }
    for (label, command) in [
        ("Install", &entrypoint.install_command),
        ("Build", &entrypoint.build_command),
        ("Test", &entrypoint.test_command),
    ] {
        if let Some(command) = command {
            writeln!(out, "- {}: `{}`", label, command)?;
        }
    }
    writeln!(out)?;

    let selected = &input.selection.selected;
    writeln!(out, "## Selected template")?;
    writeln!(out)?;
    writeln!(
        out,
        "**{}** ({}, {} image, {} instructions)",
        selected.label,
        selected.strategy,
        selected.size,
        selected.instruction_count()
    )?;
    writeln!(out)?;

    writeln!(out, "### Candidates")?;
    writeln!(out)?;
    writeln!(out, "| # | Candidate | Strategy | Size | Instructions |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for candidate in input.candidates {
        writeln!(
            out,
            "| {} | {}{} | {} | {} | {} |",
            candidate.index + 1,
            candidate.label,
            if candidate.index == selected.index { " (selected)" } else { "" },
            candidate.strategy,
            candidate.size,
            candidate.instruction_count()
        )?;
    }
    writeln!(out)?;

    writeln!(out, "### Decisions")?;
    writeln!(out)?;
    for (n, decision) in input.selection.decisions.iter().enumerate() {
        write!(out, "{}. **{}**: {}", n + 1, decision.criterion, decision.summary)?;
        if !decision.eliminated.is_empty() {
            write!(out, " (eliminated {})", decision.eliminated.join(", "))?;
        }
        writeln!(out)?;
    }
    writeln!(out)?;

    writeln!(out, "## Recommended .dockerignore")?;
    writeln!(out)?;
    writeln!(out, "```")?;
    for entry in input.ignore_list {
        writeln!(out, "{}", entry)?;
    }
    writeln!(out, "```")?;

    if !input.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "## Warnings")?;
        writeln!(out)?;
        for warning in input.warnings {
            writeln!(out, "- {}", warning)?;
        }
    }
    Ok(())
}

fn code_list(items: &[String]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(|i| format!("`{}`", i))
        .collect::<Vec<_>>()
        .join(", ")
}
