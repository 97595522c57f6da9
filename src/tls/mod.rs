//! TLS support for secure WebSocket (wss://) connections.
//!
//! Backed by rustls (feature `tls-rustls`). Without the feature, `wss`
//! addresses fail with [`Error::TlsUnavailable`](crate::Error::TlsUnavailable).

mod rustls_impl;

pub use rustls_impl::TlsConnector;

use std::sync::Arc;

use tokio_rustls::rustls::ClientConfig;

use crate::error::{Error, Result};

/// Client configuration trusting the webpki root certificate set.
///
/// # Errors
///
/// Returns [`Error::Tls`] if the ring provider rejects the default protocol versions.
pub fn client_config_with_webpki_roots() -> Result<Arc<ClientConfig>> {
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| Error::Tls(e.to_string()))?
    .with_root_certificates(root_store)
    .with_no_client_auth();

    Ok(Arc::new(config))
}
