use crate::client::providers::UpstreamError;
use thiserror::Error;

/// Failure taxonomy for the proxy core.
///
/// Caller errors (`UnknownOperation`, `Validation`) short-circuit before any
/// upstream contact; `Upstream` surfaces only after the retry executor has
/// classified the failure as fatal or exhausted its attempts. Nothing here
/// is ever downgraded to a generic success.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("unknown operation: {operation}")]
    UnknownOperation { operation: String },

    #[error("validation failed: missing required fields {missing_fields:?}")]
    Validation { missing_fields: Vec<String> },

    #[error("upstream request failed after {attempts} attempt(s): {source}")]
    Upstream {
        source: UpstreamError,
        attempts: u32,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Upstream HTTP status carried by this failure, if any.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether this failure was caused by the caller rather than the
    /// upstream or the proxy itself.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownOperation { .. } | Self::Validation { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_structured_detail() {
        let err = Error::Validation {
            missing_fields: vec!["leagueId".to_string()],
        };
        assert_eq!(
            format!("{err}"),
            "validation failed: missing required fields [\"leagueId\"]"
        );

        let err = Error::UnknownOperation {
            operation: "Bogus".to_string(),
        };
        assert!(format!("{err}").contains("Bogus"));
    }

    #[test]
    fn caller_errors_are_distinguished() {
        assert!(Error::UnknownOperation {
            operation: "X".into()
        }
        .is_caller_error());
        assert!(!Error::Internal("boom".into()).is_caller_error());
    }

    #[test]
    fn upstream_status_surfaces_through_the_wrapper() {
        let err = Error::Upstream {
            source: UpstreamError::Http {
                status: 502,
                message: "bad gateway".into(),
            },
            attempts: 4,
        };
        assert_eq!(err.upstream_status(), Some(502));
        assert_eq!(
            Error::Upstream {
                source: UpstreamError::Timeout,
                attempts: 1
            }
            .upstream_status(),
            None
        );
    }
}
