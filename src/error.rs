//! Error types for quota retrieval.
//!
//! Only the primary quota fetch and parse path surfaces a [`QuotaError`] to the
//! caller. Auxiliary lookups (subscription, billing history, transcript tokens)
//! report through [`BestEffort`] or `Option` and degrade to empty results.

use thiserror::Error;

/// Hard failures of the primary quota path.
#[derive(Error, Debug)]
pub enum QuotaError {
    /// Credentials are absent or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Upstream rejected the credentials, by HTTP status or provider status code.
    #[error("authorization rejected: {0}")]
    Auth(String),

    /// Timeout, connectivity failure or unexpected HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// A well-formed response is missing expected fields.
    #[error("data error: {0}")]
    Data(String),
}

impl From<serde_json::Error> for QuotaError {
    fn from(err: serde_json::Error) -> Self {
        QuotaError::Data(err.to_string())
    }
}

/// Result type for quota operations.
pub type Result<T> = std::result::Result<T, QuotaError>;

/// Outcome of a lookup whose failure must never reach the user.
///
/// A `Miss` keeps the reason around for logging; callers collapse it
/// explicitly with [`BestEffort::into_option`] or [`BestEffort::unwrap_or_default`].
#[derive(Debug, Clone, PartialEq)]
pub enum BestEffort<T> {
    Hit(T),
    Miss(String),
}

impl<T> BestEffort<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, BestEffort::Hit(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            BestEffort::Hit(v) => Some(v),
            BestEffort::Miss(_) => None,
        }
    }

    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }
}

impl<T> From<Result<T>> for BestEffort<T> {
    fn from(value: Result<T>) -> Self {
        match value {
            Ok(v) => BestEffort::Hit(v),
            Err(e) => BestEffort::Miss(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_collapses_to_none() {
        let miss: BestEffort<u32> = Err(QuotaError::Transport("timed out".into())).into();
        assert!(!miss.is_hit());
        assert_eq!(miss.clone().into_option(), None);
        assert_eq!(miss.unwrap_or_default(), 0);
    }

    #[test]
    fn auth_error_mentions_status() {
        let err = QuotaError::Auth("HTTP 401".into());
        assert_eq!(err.to_string(), "authorization rejected: HTTP 401");
    }
}
