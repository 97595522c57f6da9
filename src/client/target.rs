//! Parsing of `ws://` / `wss://` addresses.

use url::{Host, Url};

use crate::error::{Error, Result};

/// A validated WebSocket address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    secure: bool,
    host: String,
    port: u16,
}

impl Target {
    /// Parse a WebSocket address.
    ///
    /// The scheme is matched against the caller's text exactly: `ws` and
    /// `wss` are accepted, `WS` or `http` are not.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the address is not a URL or has no host
    /// - [`Error::UnsupportedProtocol`] if the scheme is not `ws` or `wss`
    pub fn parse(address: &str) -> Result<Self> {
        let url = Url::parse(address).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        // `Url` lowercases the scheme, so inspect the literal text.
        let literal = address
            .trim_start_matches(|c: char| c <= ' ')
            .split(':')
            .next()
            .unwrap_or_default();
        let secure = match literal {
            "ws" => false,
            "wss" => true,
            other => return Err(Error::UnsupportedProtocol(other.to_string())),
        };

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(Error::InvalidUrl(format!("missing host in {}", address))),
        };

        let port = url
            .port_or_known_default()
            .unwrap_or(if secure { 443 } else { 80 });

        Ok(Self {
            url,
            secure,
            host,
            port,
        })
    }

    /// `true` for `wss` addresses.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Host to dial and, for `wss`, to verify the certificate against.
    ///
    /// IPv6 literals are returned without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port to dial; the scheme's default when the address has none.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` for diagnostics, with IPv6 literals bracketed.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.url.host_str().unwrap_or(&self.host), self.port)
    }

    /// Value of the `Host` request header.
    ///
    /// The port is included only when the address spelled out a
    /// non-default one.
    pub fn host_header(&self) -> String {
        let host = self.url.host_str().unwrap_or(&self.host);
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Request target: path plus query, never the fragment.
    pub fn resource(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    /// The address with `ws`/`wss` replaced by `http`/`https`.
    pub fn http_url(&self) -> Url {
        let mut url = self.url.clone();
        // Switching between special schemes always succeeds.
        let _ = url.set_scheme(if self.secure { "https" } else { "http" });
        url
    }

    /// The address as given.
    pub fn url(&self) -> &Url {
        &self.url
    }
}
