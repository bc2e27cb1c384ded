use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors an upstream provider call can fail with.
///
/// The retry executor classifies these into transient (worth retrying) and
/// fatal (propagate immediately); adapters must return them as-is rather
/// than catching and swallowing.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Whether a retry is expected to help: timeouts, network failures,
    /// 429 and 5xx responses. Other HTTP statuses and decode failures are
    /// fatal.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Decode(_) => false,
        }
    }

    /// Upstream HTTP status, when the failure carries one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short classification label for audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::Decode(_) => "decode",
        }
    }

    pub(crate) fn not_found(what: &str, id: &str) -> Self {
        Self::Http {
            status: 404,
            message: format!("{what} {id} not found"),
        }
    }
}

/// Capability contract every upstream sports data source must implement.
///
/// All four operations are read-only: the only side effect is the outbound
/// call itself. Raw responses come back provider-shaped; normalization is
/// the dispatcher's job.
#[async_trait]
pub trait SportsProvider: Send + Sync {
    /// Identifier used in audit records and logs.
    fn name(&self) -> &'static str;

    /// List all leagues the provider knows about.
    async fn list_leagues(&self) -> Result<Value, UpstreamError>;

    /// List the matches of one league.
    async fn league_matches(&self, league_id: &str) -> Result<Value, UpstreamError>;

    /// Fetch a team by id. Providers without a direct lookup endpoint may
    /// list a superset of matches and filter client-side; `league_hint`
    /// scopes that scan when the caller supplies one.
    async fn team_by_id(
        &self,
        team_id: &str,
        league_hint: Option<&str>,
    ) -> Result<Value, UpstreamError>;

    /// Fetch a match by id. Same superset-and-filter allowance as
    /// [`team_by_id`](Self::team_by_id).
    async fn match_by_id(
        &self,
        match_id: &str,
        league_hint: Option<&str>,
    ) -> Result<Value, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_network_errors_are_transient() {
        assert!(UpstreamError::Timeout.is_transient());
        assert!(UpstreamError::Network("connection reset".into()).is_transient());
    }

    #[test]
    fn rate_limit_and_server_errors_are_transient() {
        for status in [429, 500, 502, 503, 599] {
            let err = UpstreamError::Http {
                status,
                message: String::new(),
            };
            assert!(err.is_transient(), "HTTP {status} should be transient");
        }
    }

    #[test]
    fn client_errors_and_decode_failures_are_fatal() {
        for status in [400, 401, 403, 404, 418, 499] {
            let err = UpstreamError::Http {
                status,
                message: String::new(),
            };
            assert!(!err.is_transient(), "HTTP {status} should be fatal");
        }
        assert!(!UpstreamError::Decode("bad json".into()).is_transient());
    }

    #[test]
    fn status_is_only_reported_for_http_errors() {
        assert_eq!(
            UpstreamError::Http {
                status: 503,
                message: String::new()
            }
            .status(),
            Some(503)
        );
        assert_eq!(UpstreamError::Timeout.status(), None);
    }
}
