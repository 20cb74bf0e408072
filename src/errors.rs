use serde::Serialize;
use thiserror::Error;

use crate::providers::ProviderError;
use crate::rank::RankError;

#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No tracks found: {0}")]
    NoTracksFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Malformed rank: {0}")]
    MalformedRank(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Re-labels storage failures raised inside an import or add transaction.
    /// Typed failures (conflicts, bad ranks) pass through untouched.
    pub fn into_transaction_error(self) -> Self {
        match self {
            AppError::Database(msg) => AppError::TransactionAborted(msg),
            other => other,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Config(format!("Serialization error: {}", e))
    }
}

impl From<RankError> for AppError {
    fn from(e: RankError) -> Self {
        AppError::MalformedRank(e.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Unsupported(msg) => AppError::InvalidUrl(msg),
            other => AppError::ProviderUnavailable(other.to_string()),
        }
    }
}
