use std::time::Duration;
use thiserror::Error;

/// Failure shapes every provider client surfaces so failover can branch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("rate limited")]
    RateLimited,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request failed: {0}")]
    Failed(String),

    #[error("all mirrors failed")]
    AllMirrorsFailed,

    #[error("unsupported source: {0}")]
    Unsupported(String),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Errors after which trying another mirror cannot help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProviderError::NotFound(_) | ProviderError::Unsupported(_) | ProviderError::NotConfigured(_)
        )
    }

    /// Classifies a failed HTTP answer and its body.
    ///
    /// Only a JSON error payload that names a missing resource counts as
    /// `NotFound`. Error pages, bare 404s and 5xx answers stay `Failed` so the
    /// next mirror gets a chance.
    pub fn from_status(status: u16, body: &str) -> Self {
        if status == 429 {
            return ProviderError::RateLimited;
        }
        match missing_resource(body) {
            Some(message) => ProviderError::NotFound(message),
            None => ProviderError::Failed(format!("HTTP {} - {}", status, truncate(body))),
        }
    }
}

/// The message of a JSON error payload saying the resource does not exist.
fn missing_resource(body: &str) -> Option<String> {
    let payload: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .filter_map(|field| payload.get(*field).and_then(|v| v.as_str()))
        .find(|text| text.to_lowercase().contains("does not exist"))
        .map(truncate)
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.status().is_some_and(|s| s.as_u16() == 429) {
            ProviderError::RateLimited
        } else {
            ProviderError::Failed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Failed(format!("invalid payload: {}", err))
    }
}
