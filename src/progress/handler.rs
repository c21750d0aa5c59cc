//! Progress handler trait and events

use crate::pipeline::error::FailureReason;
use crate::pipeline::state::Stage;
use std::time::Duration;

/// Events emitted while one analysis request runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Request accepted
    Started { repository: String },

    /// A pipeline stage began
    StageStarted { stage: Stage },

    /// Workspace retrieved and measured
    Fetched {
        bytes: u64,
        files: usize,
        duration: Duration,
    },

    /// A pipeline stage finished successfully
    StageComplete { stage: Stage, duration: Duration },

    /// Request finished with a result
    Completed { warnings: usize, total_time: Duration },

    /// Request finished with a failure, including cancellation
    Failed {
        stage: Stage,
        reason: FailureReason,
        message: String,
    },
}

/// Receives progress events; implementations must be cheap and non-blocking
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };

        handler.on_progress(&ProgressEvent::Started {
            repository: "/test".to_string(),
        });
        handler.on_progress(&ProgressEvent::StageStarted {
            stage: Stage::Fetching,
        });
        handler.on_progress(&ProgressEvent::Completed {
            warnings: 0,
            total_time: Duration::from_secs(1),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_debug() {
        let event = ProgressEvent::StageStarted {
            stage: Stage::Classifying,
        };
        assert!(format!("{:?}", event).contains("Classifying"));
    }
}
