use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::ClientConfig;

use crate::error::{Error, Result};

/// Wraps a connected stream in a client-side TLS session.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_rustls::TlsConnector,
}

impl TlsConnector {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            inner: tokio_rustls::TlsConnector::from(config),
        }
    }

    /// Run the TLS handshake, verifying the peer certificate against `domain`.
    ///
    /// `stream` is dropped, and so closed, if the handshake fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] for an invalid server name or a failed handshake.
    pub async fn connect<S>(&self, domain: &str, stream: S) -> Result<TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|_| Error::Tls(format!("invalid DNS name: {}", domain)))?;

        self.inner
            .connect(server_name, stream)
            .await
            .map_err(|e| Error::Tls(e.to_string()))
    }
}
