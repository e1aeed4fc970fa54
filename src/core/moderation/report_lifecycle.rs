// Report lifecycle - PENDING -> APPROVED | REJECTED, exactly once.
//
// All lookups that can fail (report, admin, target, author) happen before
// anything is written. The writes of one review go to the store as a single
// ReviewCommit so a report never ends up APPROVED with its target visible.

use super::audit::{AuditEvent, AuditSink};
use super::moderation_models::{
    NewReport, Report, ReportDraft, Resolution, ReviewCommit, ReviewDecision, User, UserPenalty,
};
use super::moderation_ports::{
    ContentStore, Entity, ModerationError, PenaltyStore, ReportStore, UserStore,
};
use super::penalty_issuer::{PenaltyIssuer, PenaltyRequest};
use chrono::Utc;
use std::sync::Arc;

/// An admin's approval of a report.
#[derive(Debug, Clone)]
pub struct ApproveReport {
    pub report_id: u64,
    pub review_note: Option<String>,
    /// Sanction for the target's author, if any.
    pub penalty: Option<PenaltyRequest>,
    pub admin_id: u64,
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub report: Report,
    pub penalty: Option<UserPenalty>,
}

pub struct ReportLifecycle<S> {
    store: Arc<S>,
    penalties: PenaltyIssuer<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S> ReportLifecycle<S>
where
    S: UserStore + ContentStore + ReportStore + PenaltyStore,
{
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            penalties: PenaltyIssuer::new(Arc::clone(&store), Arc::clone(&audit)),
            store,
            audit,
        }
    }

    /// File a new report. Duplicates against the same target are allowed.
    pub async fn submit(&self, request: NewReport) -> Result<Report, ModerationError> {
        self.require_user(request.reporter_id, Entity::User).await?;
        if self.store.find_target(request.target).await?.is_none() {
            return Err(ModerationError::NotFound(
                Entity::of_target(request.target.kind),
                request.target.id,
            ));
        }

        let report = self
            .store
            .insert_report(ReportDraft {
                reporter_id: request.reporter_id,
                target: request.target,
                reason: request.reason,
                detail: request.detail.filter(|d| !d.trim().is_empty()),
                created_at: Utc::now(),
            })
            .await?;

        self.audit.record(AuditEvent::ReportSubmitted {
            report_id: report.id,
            reporter_id: report.reporter_id,
            target: report.target,
            reason: report.reason,
        });
        Ok(report)
    }

    /// Approve a report: suppress its target and optionally sanction the author.
    pub async fn approve(&self, request: ApproveReport) -> Result<ApprovalOutcome, ModerationError> {
        let mut report = self.load_pending(request.report_id).await?;
        let admin = self.require_user(request.admin_id, Entity::Admin).await?;

        let target = self.store.find_target(report.target).await?.ok_or(
            ModerationError::NotFound(Entity::of_target(report.target.kind), report.target.id),
        )?;

        let now = Utc::now();
        let penalty = match request.penalty {
            Some(wanted) => {
                let reason = request
                    .review_note
                    .clone()
                    .unwrap_or_else(|| format!("Report #{} approved", report.id));
                Some(
                    self.penalties
                        .prepare(
                            target.author_id,
                            wanted.penalty_type,
                            wanted.duration_days,
                            &reason,
                            admin.id,
                            now,
                        )
                        .await?,
                )
            }
            None => None,
        };

        let resolution = Resolution {
            decision: ReviewDecision::Approved,
            note: request.review_note,
            reviewer_id: admin.id,
            reviewed_at: now,
        };
        let stored_penalty = self
            .store
            .commit_review(ReviewCommit {
                report_id: report.id,
                resolution: resolution.clone(),
                suppress: Some(report.target),
                penalty,
            })
            .await?;
        report.resolution = Some(resolution);

        self.audit.record(AuditEvent::ReportApproved {
            report_id: report.id,
            target: report.target,
            reviewer_id: admin.id,
            penalty_id: stored_penalty.as_ref().map(|p| p.id),
        });
        if let (Some(penalty), Some(wanted)) = (&stored_penalty, request.penalty) {
            self.penalties.announce(penalty, wanted.duration_days);
        }

        Ok(ApprovalOutcome {
            report,
            penalty: stored_penalty,
        })
    }

    /// Reject a report. Content and accounts are left untouched.
    pub async fn reject(
        &self,
        report_id: u64,
        review_note: Option<String>,
        admin_id: u64,
    ) -> Result<Report, ModerationError> {
        let mut report = self.load_pending(report_id).await?;
        let admin = self.require_user(admin_id, Entity::Admin).await?;

        let resolution = Resolution {
            decision: ReviewDecision::Rejected,
            note: review_note,
            reviewer_id: admin.id,
            reviewed_at: Utc::now(),
        };
        self.store
            .commit_review(ReviewCommit {
                report_id: report.id,
                resolution: resolution.clone(),
                suppress: None,
                penalty: None,
            })
            .await?;
        report.resolution = Some(resolution);

        self.audit.record(AuditEvent::ReportRejected {
            report_id: report.id,
            target: report.target,
            reviewer_id: admin.id,
        });
        Ok(report)
    }

    async fn load_pending(&self, report_id: u64) -> Result<Report, ModerationError> {
        let report = self
            .store
            .get_report(report_id)
            .await?
            .ok_or(ModerationError::NotFound(Entity::Report, report_id))?;
        if !report.is_pending() {
            return Err(ModerationError::InvalidState {
                report_id,
                status: report.status(),
            });
        }
        Ok(report)
    }

    async fn require_user(&self, user_id: u64, entity: Entity) -> Result<User, ModerationError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(ModerationError::NotFound(entity, user_id))
    }
}
