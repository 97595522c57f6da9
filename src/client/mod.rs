//! Client-side opening handshake.
//!
//! [`Connector::open`] dials a `ws://` or `wss://` address and upgrades the
//! connection; [`handshake`] does the same over a stream the caller already
//! holds. Either way the stream is shut down before any error is returned,
//! and is only handed to a [`Connection`] once every check has passed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsdial::{Config, Connector};
//!
//! let connector = Connector::new(Config::new().with_protocol("chat"));
//! let conn = connector.open("ws://127.0.0.1:9001/chat").await?;
//! assert!(conn.is_open());
//! assert_eq!(conn.protocol(), Some("chat"));
//! ```

mod stream;
mod target;

pub use stream::MaybeTlsStream;
pub use target::Target;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::Config;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::protocol::handshake::find_head_end;
use crate::protocol::{
    ClientRequest, HandshakeResponse, KeySource, OsRandom, generate_key, validate_protocol,
    validate_server_headers,
};

/// Connection returned by [`Connector::open`].
pub type WebSocketStream = Connection<MaybeTlsStream<TcpStream>>;

/// Open a WebSocket connection with the default configuration.
///
/// ## Errors
///
/// See [`Connector::open`].
pub async fn open(address: &str) -> Result<WebSocketStream> {
    Connector::default().open(address).await
}

/// Opens WebSocket connections.
///
/// Holds no per-connection state, so one `Connector` can serve any number of
/// concurrent `open` calls.
#[derive(Clone)]
pub struct Connector {
    config: Config,
    key_source: Arc<dyn KeySource>,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Create a connector drawing keys from the operating system CSPRNG.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            key_source: Arc::new(OsRandom),
        }
    }

    /// Replace the source of Sec-WebSocket-Key nonces.
    #[must_use]
    pub fn with_key_source(mut self, source: impl KeySource + 'static) -> Self {
        self.key_source = Arc::new(source);
        self
    }

    /// Get the connector's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dial `address` and perform the opening handshake.
    ///
    /// Exactly one TCP connection is made and one request written; nothing is
    /// retried.
    ///
    /// ## Errors
    ///
    /// - `Error::InvalidUrl` / `Error::UnsupportedProtocol` before any socket is opened
    /// - `Error::Connect` if the dial fails or exceeds `connect_timeout`
    /// - `Error::Tls` / `Error::TlsUnavailable` for `wss` addresses
    /// - any error from [`handshake`]
    pub async fn open(&self, address: &str) -> Result<WebSocketStream> {
        let target = Target::parse(address)?;

        #[cfg(not(feature = "tls-rustls"))]
        if target.is_secure() {
            return Err(Error::TlsUnavailable);
        }

        let request = Request::prepare(&target, &self.config, self.key_source.as_ref())?;
        let stream = self.dial(&target).await?;
        request.send(stream, &self.config).await
    }

    async fn dial(&self, target: &Target) -> Result<MaybeTlsStream<TcpStream>> {
        let addr = target.authority();
        log::debug!("dialing {} for {}", addr, target.http_url());

        let connect = TcpStream::connect((target.host(), target.port()));
        let tcp = match tokio::time::timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(tcp)) => tcp,
            Ok(Err(e)) => {
                return Err(Error::Connect {
                    addr,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(Error::Connect {
                    addr,
                    reason: format!("timed out after {:?}", self.config.connect_timeout),
                });
            }
        };

        if !target.is_secure() {
            return Ok(MaybeTlsStream::Plain(tcp));
        }
        self.wrap_tls(target, tcp).await
    }

    #[cfg(feature = "tls-rustls")]
    async fn wrap_tls(
        &self,
        target: &Target,
        tcp: TcpStream,
    ) -> Result<MaybeTlsStream<TcpStream>> {
        let tls_config = match self.config.tls {
            Some(ref tls_config) => tls_config.clone(),
            None => crate::tls::client_config_with_webpki_roots()?,
        };
        let tls = crate::tls::TlsConnector::new(tls_config)
            .connect(target.host(), tcp)
            .await?;
        Ok(MaybeTlsStream::Tls(Box::new(tls)))
    }

    #[cfg(not(feature = "tls-rustls"))]
    async fn wrap_tls(
        &self,
        _target: &Target,
        _tcp: TcpStream,
    ) -> Result<MaybeTlsStream<TcpStream>> {
        Err(Error::TlsUnavailable)
    }
}

/// Perform the opening handshake over an already connected stream.
///
/// `target` supplies the request path and `Host` header; it is not dialed.
/// The stream is consumed: on success it moves into the returned
/// [`Connection`], on failure it is shut down and dropped.
///
/// ## Errors
///
/// - `Error::Random` / `Error::InvalidHeaderValue` while building the request
/// - `Error::Write` if the request cannot be sent
/// - `Error::ResponseParse` / `Error::HandshakeTooLarge` for a bad response head
/// - `Error::Timeout` if a configured read/write deadline elapses
/// - `Error::HandshakeRejected` for any status other than 101
/// - `Error::UpgradeMismatch`, `Error::ConnectionMismatch`,
///   `Error::InvalidAcceptEncoding`, `Error::KeyMismatch` from header validation
/// - `Error::ProtocolMismatch` if the server picked a subprotocol not offered
pub async fn handshake<S>(
    target: &Target,
    mut stream: S,
    config: &Config,
    key_source: &dyn KeySource,
) -> Result<Connection<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match Request::prepare(target, config, key_source) {
        Ok(request) => request.send(stream, config).await,
        Err(err) => {
            let _ = stream.shutdown().await;
            Err(err)
        }
    }
}

/// A serialized upgrade request and the key it carries.
struct Request {
    key: String,
    bytes: Vec<u8>,
}

impl Request {
    fn prepare(target: &Target, config: &Config, key_source: &dyn KeySource) -> Result<Self> {
        let key = generate_key(key_source)?;
        let request = ClientRequest {
            origin: config.origin.clone(),
            protocols: config.protocols.clone(),
            ..ClientRequest::new(target.resource(), target.host_header(), key.clone())
        };

        let mut bytes = Vec::with_capacity(256);
        request.write(&mut bytes)?;
        Ok(Self { key, bytes })
    }

    /// Send the request on `stream` and validate the reply.
    async fn send<S>(self, mut stream: S, config: &Config) -> Result<Connection<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.negotiate(&mut stream, config).await {
            Ok((response, leftover, protocol)) => {
                log::trace!(
                    "handshake complete ({} bytes buffered)",
                    leftover.len()
                );
                Ok(Connection::new(stream, leftover, response, protocol))
            }
            Err(err) => {
                log::debug!("handshake failed: {}", err);
                let _ = stream.shutdown().await;
                Err(err)
            }
        }
    }

    async fn negotiate<S>(
        &self,
        stream: &mut S,
        config: &Config,
    ) -> Result<(HandshakeResponse, BytesMut, Option<String>)>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let deadlines = config.timeouts.as_ref();

        with_deadline(deadlines.map(|t| t.write), "write", async {
            stream
                .write_all(&self.bytes)
                .await
                .map_err(|e| Error::Write(e.to_string()))?;
            stream
                .flush()
                .await
                .map_err(|e| Error::Write(e.to_string()))
        })
        .await?;

        let (response, leftover) =
            with_deadline(deadlines.map(|t| t.read), "read", read_response(stream, config))
                .await?;

        if !response.is_switching_protocols() {
            return Err(Error::HandshakeRejected {
                status: response.status,
            });
        }

        validate_server_headers(&response.headers, &self.key)?;
        let protocol = validate_protocol(&response.headers, &config.protocols)?;

        Ok((response, leftover, protocol))
    }
}

/// Read one response head; bytes after it are returned for the framing layer.
async fn read_response<S>(
    stream: &mut S,
    config: &Config,
) -> Result<(HandshakeResponse, BytesMut)>
where
    S: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(config.read_buffer_size);

    loop {
        if let Some(end) = find_head_end(&buf) {
            config.check_handshake_size(end)?;
            let head = buf.split_to(end);
            let response = HandshakeResponse::parse(&head)?;
            log::debug!("handshake response: {} {}", response.status, response.reason);
            return Ok((response, buf));
        }
        config.check_handshake_size(buf.len())?;

        let n = stream
            .read_buf(&mut buf)
            .await
            .map_err(|e| Error::ResponseParse(e.to_string()))?;
        if n == 0 {
            return Err(Error::ResponseParse(
                "connection closed before end of response headers".into(),
            ));
        }
    }
}

async fn with_deadline<T>(
    deadline: Option<Duration>,
    what: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(what))?,
        None => fut.await,
    }
}
