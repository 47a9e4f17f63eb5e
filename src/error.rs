//! Error types for the protocol core.

use std::io;
use thiserror::Error;

use crate::handshake::BoltVersion;
use crate::packstream::PackStreamError;

/// Result alias used throughout the crate.
pub type BoltResult<T> = Result<T, BoltError>;

/// Errors surfaced by the protocol core.
///
/// Transport, codec, and protocol errors are fatal to the connection.
/// Server failures are recoverable: a RESET (ACK_FAILURE before Bolt 3)
/// returns the connection to a usable state.
#[derive(Error, Debug)]
pub enum BoltError {
    /// Version negotiation failed
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// Socket read/write failure or unexpected EOF; the connection is defunct
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// Peer closed the connection mid-exchange; the connection is defunct
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Malformed PackStream data; treated as stream corruption on receive
    #[error("codec error: {0}")]
    Codec(#[from] PackStreamError),

    /// Message received in the wrong state, or with an unknown signature
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// FAILURE response from the server
    #[error("server failure {code}: {message}")]
    Server {
        /// Status code, e.g. `Neo.ClientError.Security.Unauthorized`
        code: String,
        /// Human-readable description from the server
        message: String,
    },

    /// The requested message is not part of the negotiated protocol version
    #[error("{what} requires Bolt {required}, negotiated version is {negotiated}")]
    UnsupportedVersion {
        /// What was attempted
        what: &'static str,
        /// Minimum (or maximum) version the message belongs to
        required: &'static str,
        /// Version negotiated on this connection
        negotiated: BoltVersion,
    },

    /// The server ignored the request because the connection is in a failed
    /// state; send RESET to recover
    #[error("request ignored by server; connection requires reset")]
    Ignored,

    /// An incoming message exceeded the configured size limit
    #[error("message of {size} bytes exceeds limit of {limit}")]
    MessageTooLarge {
        /// Accumulated message size
        size: usize,
        /// Configured limit
        limit: usize,
    },

    /// A read deadline or the overall query timeout elapsed
    #[error("operation timed out")]
    Timeout,

    /// Invalid configuration, e.g. an unparseable URI
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A value could not be converted to the requested type
    #[error("type conversion error: {0}")]
    TypeConversion(String),
}

impl BoltError {
    /// Shorthand for a protocol violation.
    pub fn protocol(msg: impl Into<String>) -> Self {
        BoltError::Protocol(msg.into())
    }

    /// Shorthand for a server failure.
    pub fn server(code: impl Into<String>, message: impl Into<String>) -> Self {
        BoltError::Server {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        BoltError::Configuration(msg.into())
    }

    /// Shorthand for a conversion error.
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        BoltError::TypeConversion(msg.into())
    }

    /// Whether the connection survives this error after a RESET.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BoltError::Server { .. } | BoltError::Ignored)
    }

    /// Whether this is a server-reported failure.
    pub fn is_server_error(&self) -> bool {
        matches!(self, BoltError::Server { .. })
    }

    /// Whether a retry of the whole operation may succeed, per the server's
    /// status code classification.
    pub fn is_retryable(&self) -> bool {
        match self {
            BoltError::Server { code, .. } => {
                code.starts_with("Neo.TransientError")
                    || code == "Neo.ClientError.Cluster.NotALeader"
                    || code == "Neo.ClientError.General.ForbiddenOnReadOnlyDatabase"
            }
            BoltError::Timeout => true,
            _ => false,
        }
    }

    /// Server status code, for server failures.
    pub fn code(&self) -> Option<&str> {
        match self {
            BoltError::Server { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Handshake failure details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// Server accepted none of the offered versions
    #[error("server accepted none of the proposed versions")]
    NoCompatibleVersion,

    /// Server reply was not a version at all
    #[error("invalid handshake response: {0:02X?}")]
    InvalidResponse([u8; 4]),

    /// Server selected a version the client never offered
    #[error("server selected unoffered version {0}")]
    UnexpectedVersion(BoltVersion),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BoltError::server("Neo.ClientError.Statement.SyntaxError", "bad query");
        assert_eq!(
            err.to_string(),
            "server failure Neo.ClientError.Statement.SyntaxError: bad query"
        );

        let err = BoltError::Handshake(HandshakeError::NoCompatibleVersion);
        assert!(err.to_string().contains("handshake failed"));

        let err = BoltError::Ignored;
        assert!(err.to_string().contains("ignored"));
    }

    #[test]
    fn test_recoverability() {
        assert!(BoltError::server("Neo.ClientError.Statement.SyntaxError", "").is_recoverable());
        assert!(BoltError::Ignored.is_recoverable());
        assert!(!BoltError::ConnectionClosed.is_recoverable());
        assert!(!BoltError::protocol("bad state").is_recoverable());
        assert!(!BoltError::Codec(PackStreamError::UnexpectedEof).is_recoverable());
    }

    #[test]
    fn test_retryability() {
        assert!(
            BoltError::server("Neo.TransientError.Transaction.DeadlockDetected", "").is_retryable()
        );
        assert!(BoltError::Timeout.is_retryable());
        assert!(!BoltError::server("Neo.ClientError.Security.Unauthorized", "").is_retryable());
        assert!(!BoltError::ConnectionClosed.is_retryable());
    }

    #[test]
    fn test_from_conversions() {
        let err: BoltError = io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into();
        assert!(matches!(err, BoltError::Transport(_)));

        let err: BoltError = PackStreamError::UnknownMarker(0xC7).into();
        assert!(matches!(err, BoltError::Codec(_)));

        let err: BoltError = HandshakeError::NoCompatibleVersion.into();
        assert!(matches!(err, BoltError::Handshake(_)));
    }

    #[test]
    fn test_code_accessor() {
        let err = BoltError::server("Neo.ClientError.Security.Unauthorized", "no");
        assert_eq!(err.code(), Some("Neo.ClientError.Security.Unauthorized"));
        assert_eq!(BoltError::Timeout.code(), None);
    }
}
