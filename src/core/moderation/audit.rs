// Audit events emitted by the moderation services.
//
// Services never print. They hand events to an injected sink; infra decides
// whether those go to tracing, a table, or a test buffer.

use super::moderation_models::{
    ContentTarget, PenaltyType, ReportReason, VerdictCategory,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// New content was stored with its suppression flag set by the classifier.
    ContentFlagged {
        target: ContentTarget,
        author_id: u64,
        category: VerdictCategory,
        reason: String,
        confidence: f64,
    },
    /// The classifier failed and the content was stored suppressed instead.
    ClassifierFallback {
        target: ContentTarget,
        author_id: u64,
        error: String,
    },
    ReportSubmitted {
        report_id: u64,
        reporter_id: u64,
        target: ContentTarget,
        reason: ReportReason,
    },
    ReportApproved {
        report_id: u64,
        target: ContentTarget,
        reviewer_id: u64,
        penalty_id: Option<u64>,
    },
    ReportRejected {
        report_id: u64,
        target: ContentTarget,
        reviewer_id: u64,
    },
    PenaltyIssued {
        penalty_id: u64,
        user_id: u64,
        penalty_type: PenaltyType,
        /// `None` reads as "unlimited".
        duration_days: Option<u32>,
        reason: String,
        admin_id: u64,
    },
}

impl AuditEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::ContentFlagged { .. } => "content_flagged",
            AuditEvent::ClassifierFallback { .. } => "classifier_fallback",
            AuditEvent::ReportSubmitted { .. } => "report_submitted",
            AuditEvent::ReportApproved { .. } => "report_approved",
            AuditEvent::ReportRejected { .. } => "report_rejected",
            AuditEvent::PenaltyIssued { .. } => "penalty_issued",
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}
