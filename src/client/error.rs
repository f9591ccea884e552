//! Fetch error taxonomy.
//!
//! Transport failures are normalized into a handful of user-facing messages.
//! Anything that does not fit one of them keeps its original text in
//! [`FetchError::Unknown`].

use std::io;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No response at all: DNS failure, refused connection, dropped socket.
    #[error("Network error. Please check your connection.")]
    Network,

    /// The client gave up waiting for the response.
    #[error("Request timeout. Please try again.")]
    Timeout,

    /// HTTP 404.
    #[error("API endpoint not found.")]
    NotFound,

    /// HTTP 5xx.
    #[error("Server error occurred. Please try again later.")]
    Server,

    /// Any other failure, with its original message.
    #[error("{0}")]
    Unknown(String),
}

impl FetchError {
    /// Stable machine-readable name, used in logs and JSON responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::Server => "server",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Classify an HTTP error status.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            500..=599 => Self::Server,
            other => Self::Unknown(format!("Request failed with status code {other}")),
        }
    }

    /// Classify a transport-level failure.
    ///
    /// `io_kind` is the kind of the underlying I/O error, when there is one;
    /// it is the only place a client-side timeout shows up.
    pub fn from_transport(
        kind: ureq::ErrorKind,
        io_kind: Option<io::ErrorKind>,
        message: String,
    ) -> Self {
        if matches!(
            io_kind,
            Some(io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
        ) {
            return Self::Timeout;
        }

        match kind {
            ureq::ErrorKind::Dns
            | ureq::ErrorKind::ConnectionFailed
            | ureq::ErrorKind::ProxyConnect
            | ureq::ErrorKind::Io => Self::Network,
            _ => Self::Unknown(message),
        }
    }

    /// Classify an I/O error raised while reading the response body.
    pub fn from_body_error(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            _ => Self::Unknown(format!("failed to decode scan response: {err}")),
        }
    }
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, _) => Self::from_status(status),
            ureq::Error::Transport(transport) => {
                let io_kind = std::error::Error::source(&transport)
                    .and_then(|source| source.downcast_ref::<io::Error>())
                    .map(io::Error::kind);
                Self::from_transport(transport.kind(), io_kind, transport.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert_eq!(FetchError::from_status(404), FetchError::NotFound);
        assert_eq!(FetchError::from_status(500), FetchError::Server);
        assert_eq!(FetchError::from_status(503), FetchError::Server);
        assert_eq!(
            FetchError::from_status(401),
            FetchError::Unknown("Request failed with status code 401".into())
        );
    }

    #[test]
    fn messages_match_user_facing_text() {
        assert_eq!(
            FetchError::Server.to_string(),
            "Server error occurred. Please try again later."
        );
        assert_eq!(FetchError::NotFound.to_string(), "API endpoint not found.");
        assert_eq!(
            FetchError::Timeout.to_string(),
            "Request timeout. Please try again."
        );
        assert_eq!(
            FetchError::Network.to_string(),
            "Network error. Please check your connection."
        );
        assert_eq!(FetchError::Unknown("boom".into()).to_string(), "boom");
    }

    #[test]
    fn transport_timeouts_win_over_kind() {
        let err = FetchError::from_transport(
            ureq::ErrorKind::Io,
            Some(io::ErrorKind::TimedOut),
            "timed out reading response".into(),
        );
        assert_eq!(err, FetchError::Timeout);

        let err = FetchError::from_transport(
            ureq::ErrorKind::ConnectionFailed,
            Some(io::ErrorKind::WouldBlock),
            "connect timed out".into(),
        );
        assert_eq!(err, FetchError::Timeout);
    }

    #[test]
    fn transport_without_response_is_network() {
        for kind in [
            ureq::ErrorKind::Dns,
            ureq::ErrorKind::ConnectionFailed,
            ureq::ErrorKind::Io,
        ] {
            let err = FetchError::from_transport(
                kind,
                Some(io::ErrorKind::ConnectionRefused),
                "refused".into(),
            );
            assert_eq!(err, FetchError::Network);
        }
    }

    #[test]
    fn other_transport_errors_keep_message() {
        let err = FetchError::from_transport(
            ureq::ErrorKind::InvalidUrl,
            None,
            "Bad URL: nope".into(),
        );
        assert_eq!(err, FetchError::Unknown("Bad URL: nope".into()));
    }

    #[test]
    fn body_timeouts_are_timeouts() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "slow body");
        assert_eq!(FetchError::from_body_error(&err), FetchError::Timeout);

        let err = io::Error::new(io::ErrorKind::InvalidData, "expected value");
        assert!(matches!(FetchError::from_body_error(&err), FetchError::Unknown(_)));
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(FetchError::Network.kind(), "network");
        assert_eq!(FetchError::Unknown(String::new()).kind(), "unknown");
    }
}
