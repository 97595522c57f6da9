//! Error types for the WebSocket client handshake.
//!
//! Every variant is terminal for the `open`/`handshake` call that produced it;
//! nothing is retried internally.

use thiserror::Error;

/// Result type alias for handshake operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening a WebSocket connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The address could not be parsed or has no host.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The address scheme is neither `ws` nor `wss`.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// TCP connection failed or did not complete before the connect timeout.
    #[error("Failed to connect to {addr}: {reason}")]
    Connect {
        /// The `host:port` that was dialed.
        addr: String,
        /// Underlying failure.
        reason: String,
    },

    /// TLS configuration or handshake failure on a `wss` connection.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A `wss` address was given but the crate was built without TLS support.
    #[error("wss:// requires the `tls-rustls` feature")]
    TlsUnavailable,

    /// Writing the upgrade request failed.
    #[error("Failed to write handshake request: {0}")]
    Write(String),

    /// The server's response could not be read or parsed as HTTP.
    #[error("Malformed handshake response: {0}")]
    ResponseParse(String),

    /// The response head exceeded the configured limit.
    #[error("Handshake too large: {size} bytes (max: {max})")]
    HandshakeTooLarge {
        /// Bytes received so far.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// A read or write deadline elapsed during the handshake.
    #[error("Handshake {0} timed out")]
    Timeout(&'static str),

    /// The server answered with something other than `101 Switching Protocols`.
    #[error("Handshake rejected: expected status 101, got {status}")]
    HandshakeRejected {
        /// Status code returned by the server.
        status: u16,
    },

    /// The `Upgrade` response header is not `websocket`.
    #[error("Upgrade header mismatch")]
    UpgradeMismatch,

    /// The `Connection` response header is not `upgrade`.
    #[error("Connection header mismatch")]
    ConnectionMismatch,

    /// `Sec-WebSocket-Accept` does not match the value derived from our key.
    #[error("Sec-WebSocket-Accept does not match Sec-WebSocket-Key")]
    KeyMismatch,

    /// The server picked a subprotocol the client never offered.
    #[error("Server selected unrequested subprotocol: {0}")]
    ProtocolMismatch(String),

    /// `Sec-WebSocket-Accept` is not valid base64.
    #[error("Invalid Sec-WebSocket-Accept encoding: {0}")]
    InvalidAcceptEncoding(#[from] base64::DecodeError),

    /// The key source could not produce a nonce.
    #[error("Random source failed: {0}")]
    Random(String),

    /// A caller-supplied header value would break the request framing.
    #[error("Invalid value for header {header}: {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why the value was refused.
        reason: String,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<getrandom::Error> for Error {
    fn from(err: getrandom::Error) -> Self {
        Error::Random(err.to_string())
    }
}
