//! Analysis state machine
//!
//! `Pending → Fetching → Classifying → Resolving → Generating → Done`, with
//! `Failed(stage, reason)` reachable from every non-terminal state.

use super::error::FailureReason;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stage at which an analysis can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetching,
    Classifying,
    Resolving,
    Generating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetching => "fetch",
            Stage::Classifying => "classify",
            Stage::Resolving => "resolve",
            Stage::Generating => "generate",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Pending,
    Running { stage: Stage },
    Done,
    Failed { stage: Stage, reason: FailureReason },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    /// Stage being executed, or the stage that failed
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Running { stage } | PipelineState::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Pending => write!(f, "pending"),
            PipelineState::Running { stage } => write!(f, "{}", stage),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed { stage, reason } => write!(f, "failed({}, {})", stage, reason),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Tracks one analysis through its stages and records every state it visited
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: PipelineState,
    history: Vec<PipelineState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: PipelineState::Pending,
            history: vec![PipelineState::Pending],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    /// Moves into `stage`; stages must be entered strictly in order
    pub fn enter(&mut self, stage: Stage) -> Result<(), InvalidTransition> {
        let expected_previous = match stage {
            Stage::Fetching => PipelineState::Pending,
            Stage::Classifying => PipelineState::Running {
                stage: Stage::Fetching,
            },
            Stage::Resolving => PipelineState::Running {
                stage: Stage::Classifying,
            },
            Stage::Generating => PipelineState::Running {
                stage: Stage::Resolving,
            },
        };
        self.transition(expected_previous == self.current, PipelineState::Running { stage })
    }

    /// Finishes after generation, or after resolution for inspect-only runs
    pub fn complete(&mut self) -> Result<(), InvalidTransition> {
        let allowed = matches!(
            self.current,
            PipelineState::Running {
                stage: Stage::Resolving | Stage::Generating
            }
        );
        self.transition(allowed, PipelineState::Done)
    }

    /// Fails the current stage; a pending machine fails at fetch
    pub fn fail(&mut self, reason: FailureReason) -> Result<Stage, InvalidTransition> {
        let stage = self.current.stage().unwrap_or(Stage::Fetching);
        let to = PipelineState::Failed { stage, reason };
        self.transition(!self.current.is_terminal(), to)?;
        Ok(stage)
    }

    fn transition(&mut self, allowed: bool, to: PipelineState) -> Result<(), InvalidTransition> {
        if !allowed {
            return Err(InvalidTransition {
                from: self.current,
                to,
            });
        }
        self.current = to;
        self.history.push(to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = StateMachine::new();
        for stage in [
            Stage::Fetching,
            Stage::Classifying,
            Stage::Resolving,
            Stage::Generating,
        ] {
            machine.enter(stage).unwrap();
        }
        machine.complete().unwrap();
        assert_eq!(machine.current(), PipelineState::Done);
        assert_eq!(machine.history().len(), 6);
    }

    #[test]
    fn test_stages_cannot_be_skipped() {
        let mut machine = StateMachine::new();
        machine.enter(Stage::Fetching).unwrap();
        let err = machine.enter(Stage::Resolving).unwrap_err();
        assert_eq!(
            err.from,
            PipelineState::Running {
                stage: Stage::Fetching
            }
        );
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut machine = StateMachine::new();
        machine.enter(Stage::Fetching).unwrap();
        machine.enter(Stage::Classifying).unwrap();
        let stage = machine.fail(FailureReason::Ambiguous).unwrap();
        assert_eq!(stage, Stage::Classifying);
        assert!(machine.current().is_terminal());
        assert!(machine.fail(FailureReason::Cancelled).is_err());
        assert!(machine.complete().is_err());
    }

    #[test]
    fn test_inspect_completes_after_resolving() {
        let mut machine = StateMachine::new();
        machine.enter(Stage::Fetching).unwrap();
        assert!(machine.complete().is_err());
        machine.enter(Stage::Classifying).unwrap();
        machine.enter(Stage::Resolving).unwrap();
        machine.complete().unwrap();
    }
}
