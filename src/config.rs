// Runtime configuration, read from the environment (and `.env` via dotenv).

use crate::core::moderation::{ClassifierFailurePolicy, MAX_PAGE_SIZE};
use anyhow::{anyhow, bail, Context};
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/community.db?mode=rwc";
const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REPORT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    /// `None` when no classifier endpoint is configured. Commands that create
    /// or preview content refuse to run without one.
    pub classifier: Option<ClassifierConfig>,
    pub failure_policy: ClassifierFailurePolicy,
    pub report_page_size: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match get("CLASSIFIER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("CLASSIFIER_TIMEOUT_SECS must be a number, got '{}'", raw))?,
            None => DEFAULT_CLASSIFIER_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            bail!("CLASSIFIER_TIMEOUT_SECS must be greater than zero");
        }

        let classifier = get("CLASSIFIER_URL").map(|url| ClassifierConfig {
            url: url.trim().to_string(),
            api_key: get("CLASSIFIER_API_KEY"),
            timeout: Duration::from_secs(timeout_secs),
        });

        let failure_policy = match get("CLASSIFIER_FAILURE_POLICY") {
            Some(raw) => raw
                .parse::<ClassifierFailurePolicy>()
                .map_err(|e| anyhow!(e))?,
            None => ClassifierFailurePolicy::default(),
        };

        let report_page_size = match get("REPORT_PAGE_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("REPORT_PAGE_SIZE must be a number, got '{}'", raw))?,
            None => DEFAULT_REPORT_PAGE_SIZE,
        };
        if report_page_size == 0 || report_page_size > MAX_PAGE_SIZE {
            bail!("REPORT_PAGE_SIZE must be between 1 and {}", MAX_PAGE_SIZE);
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            classifier,
            failure_policy,
            report_page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config(&[]).unwrap();

        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert!(config.classifier.is_none());
        assert_eq!(config.failure_policy, ClassifierFailurePolicy::Reject);
        assert_eq!(config.report_page_size, 20);
    }

    #[test]
    fn test_classifier_settings_are_read() {
        let config = config(&[
            ("CLASSIFIER_URL", "http://localhost:8000/api/filter"),
            ("CLASSIFIER_API_KEY", "secret"),
            ("CLASSIFIER_TIMEOUT_SECS", "12"),
            ("CLASSIFIER_FAILURE_POLICY", "Suppress"),
        ])
        .unwrap();

        let classifier = config.classifier.unwrap();
        assert_eq!(classifier.url, "http://localhost:8000/api/filter");
        assert_eq!(classifier.api_key.as_deref(), Some("secret"));
        assert_eq!(classifier.timeout, Duration::from_secs(12));
        assert_eq!(config.failure_policy, ClassifierFailurePolicy::Suppress);
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config(&[("CLASSIFIER_URL", "  "), ("DATABASE_URL", "")]).unwrap();

        assert!(config.classifier.is_none());
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(config(&[("CLASSIFIER_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config(&[("CLASSIFIER_TIMEOUT_SECS", "0")]).is_err());
        assert!(config(&[("CLASSIFIER_FAILURE_POLICY", "ignore")]).is_err());
        assert!(config(&[("REPORT_PAGE_SIZE", "500")]).is_err());
    }
}
