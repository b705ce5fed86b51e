//! Fire-and-forget activity records.
//!
//! Records go over an unbounded channel to a drain task that writes them to
//! the log. `record` never blocks the request path and a full or closed
//! channel is swallowed — audit failures must not affect request handling.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub actor: Option<String>,
    pub action: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuditSink {
    tx: mpsc::UnboundedSender<ActivityRecord>,
}

impl AuditSink {
    /// Start the drain task on the current runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ActivityRecord>();
        tokio::spawn(async move {
            while let Some(rec) = rx.recv().await {
                info!(
                    target: "audit",
                    actor = rec.actor.as_deref().unwrap_or("-"),
                    action = %rec.action,
                    detail = %rec.detail,
                    at = %rec.at.to_rfc3339(),
                    "activity"
                );
            }
        });
        Self { tx }
    }

    pub fn record(&self, actor: Option<&str>, action: &str, detail: impl Into<String>) {
        let rec = ActivityRecord {
            actor: actor.map(|s| s.to_string()),
            action: action.to_string(),
            detail: detail.into(),
            at: Utc::now(),
        };
        if self.tx.send(rec).is_err() {
            debug!(target: "audit", "audit channel closed; record dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_never_blocks_or_errors() {
        let sink = AuditSink::spawn();
        for i in 0..100 {
            sink.record(Some("m1"), "login", format!("attempt {i}"));
        }
        // Records are best-effort; the call itself must always return.
        sink.record(None, "anonymous", "no actor");
    }
}
