use crate::prediction::types::Severity;
use crate::prediction::{
    PREDICTIONS_FAILED_TITLE, PREDICTIONS_PARTIAL_TITLE, PREDICTIONS_UPDATED_TITLE,
    PREDICTION_PAUSED_TITLE,
};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Seam to whatever surfaces user-facing events; the engine emits through
/// this and nothing else.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Routes notifications into the log stream by severity.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => info!(
                title = %notification.title,
                "{}", notification.description
            ),
            Severity::Warning => warn!(
                title = %notification.title,
                "{}", notification.description
            ),
            Severity::Error => error!(
                title = %notification.title,
                "{}", notification.description
            ),
        }
    }
}

/// Captures notifications in memory; used by tests and embedders that render
/// their own toast queue.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut self.events.lock())
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        self.events.lock().push(notification);
    }
}

pub fn paused_notification() -> Notification {
    Notification {
        title: PREDICTION_PAUSED_TITLE.to_string(),
        description: "pip ranges are invalid; min and max must be positive with min <= max"
            .to_string(),
        severity: Severity::Warning,
    }
}

/// Aggregate per-tick summary; `None` when there is nothing to report
/// (e.g. every in-flight entry was dropped by a selection change).
pub fn batch_summary_notification(success_count: usize, error_count: usize) -> Option<Notification> {
    let description = format!("{success_count} predictions succeeded, {error_count} failed");
    match (success_count, error_count) {
        (0, 0) => None,
        (_, 0) => Some(Notification {
            title: PREDICTIONS_UPDATED_TITLE.to_string(),
            description,
            severity: Severity::Info,
        }),
        (0, _) => Some(Notification {
            title: PREDICTIONS_FAILED_TITLE.to_string(),
            description,
            severity: Severity::Error,
        }),
        _ => Some(Notification {
            title: PREDICTIONS_PARTIAL_TITLE.to_string(),
            description,
            severity: Severity::Warning,
        }),
    }
}
