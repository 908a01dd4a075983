//! Error types for the radio-browser facade

use std::fmt;

/// Result type alias for radio-browser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single mirror attempt did not produce a usable response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The mirror answered with a status other than 200
    Status(u16),
    /// The attempt exceeded the per-attempt timeout
    Timeout,
    /// Connection refused, DNS failure, TLS error...
    Transport(String),
    /// Status 200 but the body was not valid JSON
    Malformed(String),
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP status {}", status),
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

/// One failed attempt against one mirror
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorFailure {
    pub mirror: String,
    pub cause: FailureCause,
}

impl fmt::Display for MirrorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.mirror, self.cause)
    }
}

/// Errors that can occur when using the radio-browser client
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP client construction or request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Every mirror failed for one logical request
    #[error("Radio service temporarily unavailable ({})", last_failure(.failures))]
    Unavailable { failures: Vec<MirrorFailure> },

    /// Station lookup returned no result
    #[error("Station not found: {0}")]
    StationNotFound(String),

    /// Neither discovery nor fallback produced a mirror
    #[error("No upstream mirror available: discovery returned nothing and no fallback mirror is configured")]
    NoMirrors,

    /// DNS discovery failed
    #[error("DNS discovery failed: {0}")]
    Dns(String),

    /// Configuration error (from grconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

fn last_failure(failures: &[MirrorFailure]) -> String {
    match failures.last() {
        Some(failure) => format!("last error: {}", failure),
        None => "no mirror was tried".to_string(),
    }
}

impl Error {
    /// True when every mirror failed
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Per-mirror causes, in attempt order, for an `Unavailable` error
    pub fn failures(&self) -> &[MirrorFailure] {
        match self {
            Self::Unavailable { failures } => failures,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_reports_last_failure() {
        let err = Error::Unavailable {
            failures: vec![
                MirrorFailure {
                    mirror: "https://a".into(),
                    cause: FailureCause::Timeout,
                },
                MirrorFailure {
                    mirror: "https://b".into(),
                    cause: FailureCause::Status(502),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Radio service temporarily unavailable (last error: https://b: HTTP status 502)"
        );
        assert!(err.is_unavailable());
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn test_unavailable_without_attempts() {
        let err = Error::Unavailable { failures: vec![] };
        assert!(err.to_string().contains("no mirror was tried"));
        assert!(Error::NoMirrors.failures().is_empty());
    }
}
