use super::GENERATED_HEADER;
use crate::pipeline::phases::classify::ProjectProfile;
use crate::pipeline::phases::template::{Instruction, TemplateCandidate};

pub fn render(candidate: &TemplateCandidate, profile: &ProjectProfile) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');
    out.push_str(&format!("# Stack: {}\n", profile.stack_label()));
    out.push_str(&format!("# Strategy: {}\n", candidate.label));

    for instruction in &candidate.instructions {
        if matches!(instruction, Instruction::From { .. }) {
            out.push('\n');
        }
        out.push_str(&render_instruction(instruction));
        out.push('\n');
    }
    out
}

pub fn render_instruction(instruction: &Instruction) -> String {
    match instruction {
        Instruction::From { image, alias } => match alias {
            Some(alias) => format!("FROM {} AS {}", image, alias),
            None => format!("FROM {}", image),
        },
        Instruction::Workdir(dir) => format!("WORKDIR {}", dir),
        Instruction::Env(pairs) => {
            let assignments: Vec<String> = pairs
                .iter()
                .map(|(key, value)| format!("{}={}", key, env_value(value)))
                .collect();
            format!("ENV {}", assignments.join(" \\\n    "))
        }
        Instruction::Copy {
            from,
            sources,
            dest,
        } => {
            let flag = from
                .as_ref()
                .map(|stage| format!("--from={} ", stage))
                .unwrap_or_default();
            let mut args: Vec<&str> = sources.iter().map(String::as_str).collect();
            args.push(dest);
            if args.iter().any(|a| a.contains(char::is_whitespace)) {
                format!("COPY {}{}", flag, json_array(&args))
            } else {
                format!("COPY {}{}", flag, args.join(" "))
            }
        }
        Instruction::Run(command) => format!("RUN {}", command),
        Instruction::Expose(ports) => {
            let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
            format!("EXPOSE {}", ports.join(" "))
        }
        Instruction::Cmd(argv) => {
            let args: Vec<&str> = argv.iter().map(String::as_str).collect();
            format!("CMD {}", json_array(&args))
        }
    }
}

fn env_value(value: &str) -> String {
    if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '"') {
        json_string(value)
    } else {
        value.to_string()
    }
}

fn json_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn json_array(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| json_string(s)).collect();
    format!("[{}]", quoted.join(", "))
}
