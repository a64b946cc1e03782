//! Session error types.

use thiserror::Error;

use crate::core::ProtocolError;

/// Errors of the multiworld session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The socket closed or failed after the handshake.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The server rejected the slot credentials. Not retried automatically.
    #[error("connection refused by server: {}", .0.join(", "))]
    Refused(Vec<String>),

    /// No `Connected` arrived in time.
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// The session task is gone; nothing can be sent.
    #[error("session closed")]
    Closed,

    /// No address to connect to.
    #[error("invalid server address `{0}`")]
    InvalidAddress(String),

    /// A packet from the server could not be used.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A packet for the server could not be encoded.
    #[error("failed to encode packet: {0}")]
    Encode(#[from] serde_json::Error),

    /// Websocket transport failure.
    #[cfg(feature = "session")]
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl SessionError {
    /// Whether the supervisor should try again after a delay.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Refused(_) | Self::Closed | Self::InvalidAddress(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_is_not_retryable() {
        let err = SessionError::Refused(vec!["InvalidSlot".into()]);
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "connection refused by server: InvalidSlot"
        );
    }

    #[test]
    fn test_lost_connection_is_retryable() {
        assert!(SessionError::ConnectionLost("reset".into()).is_retryable());
        assert!(SessionError::HandshakeTimeout.is_retryable());
    }
}
