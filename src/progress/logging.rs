//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { repository } => {
                info!(repo = %repository, "Starting analysis");
            }
            ProgressEvent::StageStarted { stage } => {
                info!(stage = %stage, "Starting stage");
            }
            ProgressEvent::Fetched {
                bytes,
                files,
                duration,
            } => {
                debug!(
                    bytes,
                    files,
                    fetch_ms = duration.as_millis(),
                    "Workspace ready"
                );
            }
            ProgressEvent::StageComplete { stage, duration } => {
                info!(
                    stage = %stage,
                    elapsed_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::Completed {
                warnings,
                total_time,
            } => {
                info!(
                    warnings,
                    total_time_ms = total_time.as_millis(),
                    "Analysis complete"
                );
            }
            ProgressEvent::Failed {
                stage,
                reason,
                message,
            } => {
                warn!(stage = %stage, reason = %reason, error = %message, "Analysis failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::FailureReason;
    use crate::pipeline::state::Stage;
    use std::time::Duration;

    #[test]
    fn test_logging_all_events() {
        let handler = LoggingHandler;

        let events = vec![
            ProgressEvent::Started {
                repository: "/test".to_string(),
            },
            ProgressEvent::StageStarted {
                stage: Stage::Fetching,
            },
            ProgressEvent::Fetched {
                bytes: 2048,
                files: 12,
                duration: Duration::from_millis(40),
            },
            ProgressEvent::StageComplete {
                stage: Stage::Fetching,
                duration: Duration::from_millis(40),
            },
            ProgressEvent::Completed {
                warnings: 1,
                total_time: Duration::from_secs(2),
            },
            ProgressEvent::Failed {
                stage: Stage::Classifying,
                reason: FailureReason::Ambiguous,
                message: "Test error".to_string(),
            },
        ];

        for event in events {
            handler.on_progress(&event);
        }
    }
}
