//! Configuration for opening WebSocket connections.

use std::time::Duration;

#[cfg(feature = "tls-rustls")]
use std::sync::Arc;

/// Default bound on the TCP connect step.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default limit on the size of the server's response head.
pub const DEFAULT_MAX_HANDSHAKE_SIZE: usize = 8192;

/// Read/write deadlines applied to the handshake I/O.
///
/// Only the connect step is bounded unless these are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Maximum time to wait for the complete response head.
    ///
    /// Default: 30 seconds
    pub read: Duration,

    /// Maximum time to write the upgrade request.
    ///
    /// Default: 30 seconds
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(30),
            write: Duration::from_secs(30),
        }
    }
}

impl Timeouts {
    /// Create new timeouts with custom values.
    #[must_use]
    pub const fn new(read: Duration, write: Duration) -> Self {
        Self { read, write }
    }
}

/// Client handshake configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bound on the TCP connect step.
    ///
    /// Default: 15 seconds
    pub connect_timeout: Duration,

    /// Read/write deadlines for the request and response.
    ///
    /// If `None`, reads and writes block until the peer acts or the
    /// transport fails.
    /// Default: None
    pub timeouts: Option<Timeouts>,

    /// Maximum size of the server's response head in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,

    /// Initial capacity of the response read buffer.
    ///
    /// Default: 1 KB (1024)
    pub read_buffer_size: usize,

    /// Value sent in the `Origin` header.
    ///
    /// Default: None (header omitted)
    pub origin: Option<String>,

    /// Subprotocols offered in `Sec-WebSocket-Protocol`, in preference order.
    ///
    /// Default: empty (header omitted)
    pub protocols: Vec<String>,

    /// TLS client configuration used for `wss` addresses.
    ///
    /// If `None`, a configuration trusting the webpki root set is built on
    /// each `wss` dial.
    #[cfg(feature = "tls-rustls")]
    pub tls: Option<Arc<rustls::ClientConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeouts: None,
            max_handshake_size: DEFAULT_MAX_HANDSHAKE_SIZE,
            read_buffer_size: 1024,
            origin: None,
            protocols: Vec::new(),
            #[cfg(feature = "tls-rustls")]
            tls: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set read/write deadlines for the handshake.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Set the maximum response head size.
    #[must_use]
    pub const fn with_max_handshake_size(mut self, size: usize) -> Self {
        self.max_handshake_size = size;
        self
    }

    /// Set read buffer size.
    #[must_use]
    pub const fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Send an `Origin` header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Offer a subprotocol. May be called repeatedly; order is preserved.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocols.push(protocol.into());
        self
    }

    /// Use a custom TLS client configuration for `wss` addresses.
    #[cfg(feature = "tls-rustls")]
    #[must_use]
    pub fn with_tls(mut self, tls: Arc<rustls::ClientConfig>) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Check that a handshake buffer of `size` bytes is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`](crate::Error::HandshakeTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_handshake_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_handshake_size {
            Err(crate::Error::HandshakeTooLarge {
                size,
                max: self.max_handshake_size,
            })
        } else {
            Ok(())
        }
    }
}
