//! User-facing notifications, decoupled from any UI toolkit.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Notification {
    pub fn success(summary: impl Into<String>, detail: impl Into<String>) -> Notification {
        Notification {
            severity: Severity::Success,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Notification {
        Notification {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

/// Sink the controller reports through; screens render these however
/// they like.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default sink: notifications go to the log.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => {
                tracing::info!(summary = %notification.summary, detail = %notification.detail, "notification")
            }
            Severity::Error => {
                tracing::warn!(summary = %notification.summary, detail = %notification.detail, "notification")
            }
        }
    }
}
