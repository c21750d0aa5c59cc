//! Optimizer/scorer
//!
//! Candidates are filtered criterion by criterion, each a hard tie-break
//! before the next: multi-stage, size class, instruction count, emission
//! order. Every criterion consulted leaves a decision record.

use super::classify::ProjectProfile;
use super::template::{BuildStrategy, TemplateCandidate};
use crate::stack::StackRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Entries every build context can drop
const BASE_IGNORE: &[&str] = &[
    ".git",
    ".gitignore",
    ".dockerignore",
    "Dockerfile*",
    "docker-compose*.yml",
    "compose*.yml",
    ".env",
    ".env.*",
    "!.env.example",
    "*.log",
    ".idea",
    ".vscode",
    ".DS_Store",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    SoleCandidate,
    MultiStage,
    SizeClass,
    InstructionCount,
    EmissionOrder,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Criterion::SoleCandidate => "sole candidate",
            Criterion::MultiStage => "multi-stage preferred",
            Criterion::SizeClass => "smaller image size class",
            Criterion::InstructionCount => "fewer instructions",
            Criterion::EmissionOrder => "earliest emitted",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub criterion: Criterion,
    pub summary: String,
    /// Labels of the candidates still in the running afterwards
    pub kept: Vec<String>,
    pub eliminated: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub selected: TemplateCandidate,
    pub considered: usize,
    pub decisions: Vec<DecisionRecord>,
}

/// Picks the best candidate; `None` only for an empty input
pub fn select(candidates: &[TemplateCandidate]) -> Option<Selection> {
    let mut remaining: Vec<&TemplateCandidate> = candidates.iter().collect();
    let mut decisions = Vec::new();

    if remaining.len() == 1 {
        decisions.push(DecisionRecord {
            criterion: Criterion::SoleCandidate,
            summary: format!("{} is the only candidate", remaining[0].label),
            kept: vec![remaining[0].label.clone()],
            eliminated: Vec::new(),
        });
    }

    if remaining.len() > 1 && remaining.iter().any(|c| c.strategy == BuildStrategy::MultiStage) {
        narrow(&mut remaining, &mut decisions, Criterion::MultiStage, |c| {
            usize::from(c.strategy != BuildStrategy::MultiStage)
        });
    } else if remaining.len() > 1 {
        decisions.push(DecisionRecord {
            criterion: Criterion::MultiStage,
            summary: "no multi-stage candidate is available for this stack".to_string(),
            kept: labels(&remaining),
            eliminated: Vec::new(),
        });
    }
    if remaining.len() > 1 {
        narrow(&mut remaining, &mut decisions, Criterion::SizeClass, |c| c.size as usize);
    }
    if remaining.len() > 1 {
        narrow(&mut remaining, &mut decisions, Criterion::InstructionCount, |c| {
            c.instruction_count()
        });
    }
    if remaining.len() > 1 {
        narrow(&mut remaining, &mut decisions, Criterion::EmissionOrder, |c| c.index);
    }

    let selected = (*remaining.first()?).clone();
    debug!(selected = %selected.label, criteria = decisions.len(), "Template selected");
    Some(Selection {
        selected,
        considered: candidates.len(),
        decisions,
    })
}

fn labels(candidates: &[&TemplateCandidate]) -> Vec<String> {
    candidates.iter().map(|c| c.label.clone()).collect()
}

/// Keeps the candidates with the lowest `score`
fn narrow(
    remaining: &mut Vec<&TemplateCandidate>,
    decisions: &mut Vec<DecisionRecord>,
    criterion: Criterion,
    score: impl Fn(&TemplateCandidate) -> usize,
) {
    let Some(best) = remaining.iter().map(|c| score(c)).min() else {
        return;
    };
    let (kept, eliminated): (Vec<&TemplateCandidate>, Vec<&TemplateCandidate>) =
        remaining.iter().copied().partition(|c| score(c) == best);

    let summary = match criterion {
        Criterion::SizeClass => format!(
            "kept {} of {} candidates with a {} estimated image",
            kept.len(),
            remaining.len(),
            kept[0].size
        ),
        Criterion::InstructionCount => format!(
            "kept {} of {} candidates with {} instructions",
            kept.len(),
            remaining.len(),
            best
        ),
        Criterion::EmissionOrder => format!("{} was emitted first", kept[0].label),
        _ => format!("kept {} of {} candidates", kept.len(), remaining.len()),
    };

    decisions.push(DecisionRecord {
        criterion,
        summary,
        kept: labels(&kept),
        eliminated: labels(&eliminated),
    });
    *remaining = kept;
}

/// Advisory `.dockerignore` entries for the profile's stack
pub fn recommend_ignore_list(profile: &ProjectProfile) -> Vec<String> {
    let mut entries: Vec<String> = BASE_IGNORE.iter().map(|e| e.to_string()).collect();
    if let Some(build_system) = StackRegistry::global().get_build_system(profile.build_system) {
        for pattern in build_system.ignore_patterns() {
            if !entries.iter().any(|e| e == pattern) {
                entries.push(pattern.to_string());
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::phases::template::Instruction;
    use crate::stack::SizeClass;

    fn candidate(index: usize, strategy: BuildStrategy, size: SizeClass, count: usize) -> TemplateCandidate {
        TemplateCandidate {
            index,
            label: format!("c{}", index),
            base_image: "img".to_string(),
            strategy,
            size,
            instructions: vec![Instruction::Run("true".to_string()); count],
        }
    }

    #[test]
    fn test_multi_stage_wins_first() {
        let candidates = vec![
            candidate(0, BuildStrategy::SingleStage, SizeClass::Small, 3),
            candidate(1, BuildStrategy::MultiStage, SizeClass::Medium, 12),
        ];
        let selection = select(&candidates).unwrap();
        assert_eq!(selection.selected.index, 1);
        assert_eq!(selection.decisions.len(), 1);
        assert_eq!(selection.decisions[0].criterion, Criterion::MultiStage);
        assert_eq!(selection.decisions[0].eliminated, vec!["c0"]);
    }

    #[test]
    fn test_each_tie_break_recorded_in_order() {
        let candidates = vec![
            candidate(0, BuildStrategy::SingleStage, SizeClass::Medium, 6),
            candidate(1, BuildStrategy::SingleStage, SizeClass::Small, 6),
            candidate(2, BuildStrategy::SingleStage, SizeClass::Small, 6),
            candidate(3, BuildStrategy::SingleStage, SizeClass::Small, 8),
        ];
        let selection = select(&candidates).unwrap();
        assert_eq!(selection.selected.index, 1);
        let criteria: Vec<_> = selection.decisions.iter().map(|d| d.criterion).collect();
        assert_eq!(
            criteria,
            vec![
                Criterion::MultiStage,
                Criterion::SizeClass,
                Criterion::InstructionCount,
                Criterion::EmissionOrder,
            ]
        );
    }

    #[test]
    fn test_sole_candidate_and_empty_input() {
        let candidates = vec![candidate(0, BuildStrategy::SingleStage, SizeClass::Large, 5)];
        let selection = select(&candidates).unwrap();
        assert_eq!(selection.decisions.len(), 1);
        assert_eq!(selection.decisions[0].criterion, Criterion::SoleCandidate);
        assert!(select(&[]).is_none());
    }

    #[test]
    fn test_selection_is_deterministic() {
        let candidates = vec![
            candidate(0, BuildStrategy::SingleStage, SizeClass::Small, 6),
            candidate(1, BuildStrategy::SingleStage, SizeClass::Small, 6),
        ];
        let first = select(&candidates).unwrap();
        let second = select(&candidates).unwrap();
        assert_eq!(first.selected, second.selected);
        assert_eq!(first.decisions, second.decisions);
    }
}
