// Composition root for CLI commands: one store, one audit sink, and the
// services built on top of them.

use crate::config::AppConfig;
use crate::core::moderation::{
    AuditSink, ModerationGate, ModerationQueries, PenaltyIssuer, ReportLifecycle,
};
use crate::infra::audit::TracingAuditSink;
use crate::infra::classifier::HttpContentClassifier;
use crate::infra::community::SqliteCommunityStore;
use anyhow::{Context, Result};
use std::sync::Arc;

pub type Gate = ModerationGate<SqliteCommunityStore, HttpContentClassifier>;

pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<SqliteCommunityStore>,
    audit: Arc<dyn AuditSink>,
}

impl AppContext {
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let store = SqliteCommunityStore::new(&config.database_url)
            .await
            .with_context(|| format!("failed to open database at {}", config.database_url))?;
        tracing::info!(database = %config.database_url, "Community store ready");

        Ok(Self {
            config,
            store: Arc::new(store),
            audit: Arc::new(TracingAuditSink),
        })
    }

    /// The content gate needs a classifier endpoint; other commands don't.
    pub fn gate(&self) -> Result<Gate> {
        let classifier_config = self
            .config
            .classifier
            .as_ref()
            .context("CLASSIFIER_URL is not set; it is required to create or check content")?;

        let classifier = HttpContentClassifier::new(
            classifier_config.url.clone(),
            classifier_config.api_key.clone(),
            classifier_config.timeout,
        )
        .context("failed to build classifier client")?;

        Ok(
            ModerationGate::new(Arc::clone(&self.store), classifier, Arc::clone(&self.audit))
                .with_failure_policy(self.config.failure_policy),
        )
    }

    pub fn lifecycle(&self) -> ReportLifecycle<SqliteCommunityStore> {
        ReportLifecycle::new(Arc::clone(&self.store), Arc::clone(&self.audit))
    }

    pub fn penalties(&self) -> PenaltyIssuer<SqliteCommunityStore> {
        PenaltyIssuer::new(Arc::clone(&self.store), Arc::clone(&self.audit))
    }

    pub fn queries(&self) -> ModerationQueries<SqliteCommunityStore> {
        ModerationQueries::new(Arc::clone(&self.store))
    }
}
