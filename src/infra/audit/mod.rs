// Audit sinks. Production writes structured tracing events on the `audit`
// target so they can be filtered or shipped separately from app logs.

use crate::core::moderation::{AuditEvent, AuditSink};

pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let name = event.name();
        match event {
            AuditEvent::ContentFlagged {
                target,
                author_id,
                category,
                reason,
                confidence,
            } => tracing::info!(
                target: "audit",
                event = name,
                content = %target,
                author_id,
                %category,
                reason = %reason,
                confidence,
                "Content flagged by classifier"
            ),
            AuditEvent::ClassifierFallback {
                target,
                author_id,
                error,
            } => tracing::warn!(
                target: "audit",
                event = name,
                content = %target,
                author_id,
                error = %error,
                "Classifier unavailable, content stored suppressed"
            ),
            AuditEvent::ReportSubmitted {
                report_id,
                reporter_id,
                target,
                reason,
            } => tracing::info!(
                target: "audit",
                event = name,
                report_id,
                reporter_id,
                content = %target,
                %reason,
                "Report submitted"
            ),
            AuditEvent::ReportApproved {
                report_id,
                target,
                reviewer_id,
                penalty_id,
            } => tracing::info!(
                target: "audit",
                event = name,
                report_id,
                content = %target,
                reviewer_id,
                penalty_id = ?penalty_id,
                "Report approved, target suppressed"
            ),
            AuditEvent::ReportRejected {
                report_id,
                target,
                reviewer_id,
            } => tracing::info!(
                target: "audit",
                event = name,
                report_id,
                content = %target,
                reviewer_id,
                "Report rejected"
            ),
            AuditEvent::PenaltyIssued {
                penalty_id,
                user_id,
                penalty_type,
                duration_days,
                reason,
                admin_id,
            } => {
                let duration = duration_days
                    .map(|d| format!("{} days", d))
                    .unwrap_or_else(|| "unlimited".to_string());
                tracing::info!(
                    target: "audit",
                    event = name,
                    penalty_id,
                    user_id,
                    %penalty_type,
                    duration = %duration,
                    reason = %reason,
                    admin_id,
                    "Penalty issued"
                )
            }
        }
    }
}

/// Keeps every event in memory so tests can assert on what was emitted.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingAuditSink {
    events: std::sync::Mutex<Vec<AuditEvent>>,
}

#[cfg(test)]
impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of recorded events with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }
}

#[cfg(test)]
impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}
