// Penalty issuance - sanctions attached to user accounts.
//
// Penalties are only ever created here, either directly by an admin or as
// part of an approved report. Existing penalties are never merged or checked;
// each issuance is its own record.

use super::audit::{AuditEvent, AuditSink};
use super::moderation_models::{PenaltyDraft, PenaltyType, User, UserPenalty};
use super::moderation_ports::{Entity, ModerationError, PenaltyStore, UserStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// What an admin asked for when approving a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyRequest {
    pub penalty_type: PenaltyType,
    pub duration_days: Option<u32>,
}

pub struct PenaltyIssuer<S> {
    store: Arc<S>,
    audit: Arc<dyn AuditSink>,
}

impl<S: UserStore + PenaltyStore> PenaltyIssuer<S> {
    pub fn new(store: Arc<S>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    /// Issue a penalty right away.
    pub async fn issue(
        &self,
        user_id: u64,
        penalty_type: PenaltyType,
        duration_days: Option<u32>,
        reason: &str,
        admin_id: u64,
    ) -> Result<UserPenalty, ModerationError> {
        let draft = self
            .prepare(user_id, penalty_type, duration_days, reason, admin_id, Utc::now())
            .await?;
        let penalty = self.store.insert_penalty(draft).await?;
        self.announce(&penalty, duration_days);
        Ok(penalty)
    }

    /// Validate the parties and compute dates without storing anything.
    ///
    /// Report approval uses this so the penalty can be written in the same
    /// unit of work as the report resolution.
    pub(crate) async fn prepare(
        &self,
        user_id: u64,
        penalty_type: PenaltyType,
        duration_days: Option<u32>,
        reason: &str,
        admin_id: u64,
        now: DateTime<Utc>,
    ) -> Result<PenaltyDraft, ModerationError> {
        let user = self.require(user_id, Entity::User).await?;
        let admin = self.require(admin_id, Entity::Admin).await?;
        let end_date = penalty_type
            .end_date(now, duration_days)
            .map_err(|e| ModerationError::InvalidContent(e.to_string()))?;

        Ok(PenaltyDraft {
            user_id: user.id,
            penalty_type,
            reason: reason.to_string(),
            start_date: now,
            end_date,
            admin_id: admin.id,
        })
    }

    pub(crate) fn announce(&self, penalty: &UserPenalty, duration_days: Option<u32>) {
        self.audit.record(AuditEvent::PenaltyIssued {
            penalty_id: penalty.id,
            user_id: penalty.user_id,
            penalty_type: penalty.penalty_type,
            duration_days,
            reason: penalty.reason.clone(),
            admin_id: penalty.admin_id,
        });
    }

    pub async fn penalties_for(&self, user_id: u64) -> Result<Vec<UserPenalty>, ModerationError> {
        self.require(user_id, Entity::User).await?;
        self.store.penalties_for_user(user_id).await
    }

    /// Penalties that currently restrict the user.
    pub async fn active_penalties(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserPenalty>, ModerationError> {
        Ok(self
            .penalties_for(user_id)
            .await?
            .into_iter()
            .filter(|p| p.is_in_force(now))
            .collect())
    }

    async fn require(&self, user_id: u64, entity: Entity) -> Result<User, ModerationError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(ModerationError::NotFound(entity, user_id))
    }
}
