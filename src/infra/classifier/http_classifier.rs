// =============================================================================
// HTTP CONTENT CLASSIFIER
// =============================================================================
//
// Implements `ContentClassifier` against an external HTTP filtering service.
//
// **Wire format:**
// - Request: `POST {endpoint}` with `{ "text", "source", "userId" }`
// - Response: `{ "isBlocked", "category", "reason", "confidence", "detectedWords" }`
//
// **Environment Variables:**
// - `CLASSIFIER_URL` - endpoint to POST to
// - `CLASSIFIER_API_KEY` - optional bearer token
// - `CLASSIFIER_TIMEOUT_SECS` - per-request timeout
//
// Every failure (timeout, transport, non-2xx, bad body) maps to a
// `ClassifierError`; the gate never treats it as a clean verdict.

use crate::core::moderation::{
    ClassificationVerdict, ClassifierError, ContentClassifier, VerdictCategory,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterRequest<'a> {
    text: &'a str,
    source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<u64>,
}

/// Response body. Only `isBlocked` is mandatory; everything else degrades to
/// a neutral value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterResponse {
    is_blocked: bool,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    detected_words: Vec<String>,
}

impl FilterResponse {
    fn into_verdict(self) -> ClassificationVerdict {
        let category = match self.category.as_deref() {
            Some(raw) => raw.parse().unwrap_or(VerdictCategory::Other),
            None if self.is_blocked => VerdictCategory::Other,
            None => VerdictCategory::Clean,
        };
        ClassificationVerdict::new(
            self.is_blocked,
            category,
            self.reason.unwrap_or_default(),
            self.confidence.unwrap_or(if self.is_blocked { 1.0 } else { 0.0 }),
            self.detected_words,
        )
    }
}

/// Decode a classifier response body into a verdict.
pub fn parse_verdict(body: &str) -> Result<ClassificationVerdict, ClassifierError> {
    serde_json::from_str::<FilterResponse>(body)
        .map(FilterResponse::into_verdict)
        .map_err(|e| ClassifierError::Decode(e.to_string()))
}

pub struct HttpContentClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpContentClassifier {
    pub fn new(endpoint: String, api_key: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

fn transport_error(err: reqwest::Error) -> ClassifierError {
    if err.is_timeout() {
        ClassifierError::Timeout
    } else {
        ClassifierError::Transport(err.to_string())
    }
}

#[async_trait]
impl ContentClassifier for HttpContentClassifier {
    async fn classify(
        &self,
        text: &str,
        source_tag: &str,
        author_id: Option<u64>,
    ) -> Result<ClassificationVerdict, ClassifierError> {
        let payload = FilterRequest {
            text,
            source: source_tag,
            user_id: author_id,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let verdict = parse_verdict(&body)?;
        tracing::debug!(
            source = source_tag,
            blocked = verdict.is_blocked,
            category = %verdict.category,
            "Classifier verdict received"
        );
        Ok(verdict)
    }
}
