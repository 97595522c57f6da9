//! Client side of the WebSocket opening handshake (RFC 6455 Section 4.1).
//!
//! Builds the HTTP Upgrade request and parses the server's response head.

use crate::error::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};

/// The WebSocket GUID used in the Sec-WebSocket-Accept calculation (RFC 6455).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Value of the `Upgrade` header in both directions.
pub const UPGRADE_WEBSOCKET: &str = "websocket";

/// Value of the `Connection` header in both directions.
pub const CONNECTION_UPGRADE: &str = "upgrade";

/// The only protocol version this client speaks.
pub const WS_VERSION: &str = "13";

/// Raw SHA-1 digest of `key` followed by [`WS_GUID`].
pub fn accept_digest(key: &str) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    hasher.finalize().into()
}

/// Computes the Sec-WebSocket-Accept value from the client's Sec-WebSocket-Key.
///
/// The accept key is calculated as: Base64(SHA-1(key + GUID))
///
/// # Example
///
/// ```
/// use wsdial::protocol::handshake::compute_accept_key;
///
/// let key = "dGhlIHNhbXBsZSBub25jZQ==";
/// let accept = compute_accept_key(key);
/// assert_eq!(accept, "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=");
/// ```
pub fn compute_accept_key(key: &str) -> String {
    BASE64.encode(accept_digest(key))
}

/// Validate that a header value does not contain CR or LF characters.
///
/// # Errors
/// Returns `Error::InvalidHeaderValue` if the value contains `\r` or `\n`.
fn validate_header_value(header_name: &str, value: &str) -> Result<()> {
    if value.contains('\r') || value.contains('\n') {
        return Err(Error::InvalidHeaderValue {
            header: header_name.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    Ok(())
}

/// HTTP header list with case-insensitive lookup.
///
/// Names keep their original spelling and order. Repeated headers are kept;
/// [`Headers::get`] returns the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// WebSocket upgrade request sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRequest {
    /// Request target: path plus optional query (e.g., "/chat?room=1").
    pub resource: String,
    /// The Host header value.
    pub host: String,
    /// The base64 Sec-WebSocket-Key.
    pub key: String,
    /// The Origin header value (optional).
    pub origin: Option<String>,
    /// Offered Sec-WebSocket-Protocol values (optional).
    pub protocols: Vec<String>,
}

impl ClientRequest {
    /// Create a request with only the mandatory headers.
    pub fn new(
        resource: impl Into<String>,
        host: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            host: host.into(),
            key: key.into(),
            origin: None,
            protocols: Vec::new(),
        }
    }

    /// Write the HTTP request to a buffer.
    ///
    /// # Errors
    /// Returns `Error::InvalidHeaderValue` if origin or protocols contain CR/LF.
    pub fn write(&self, buf: &mut Vec<u8>) -> Result<()> {
        validate_header_value("Host", &self.host)?;
        if let Some(ref origin) = self.origin {
            validate_header_value("Origin", origin)?;
        }
        for proto in &self.protocols {
            validate_header_value("Sec-WebSocket-Protocol", proto)?;
        }

        buf.extend_from_slice(format!("GET {} HTTP/1.1\r\n", self.resource).as_bytes());
        buf.extend_from_slice(format!("Host: {}\r\n", self.host).as_bytes());
        buf.extend_from_slice(b"Upgrade: websocket\r\n");
        buf.extend_from_slice(b"Connection: Upgrade\r\n");
        buf.extend_from_slice(format!("Sec-WebSocket-Key: {}\r\n", self.key).as_bytes());
        buf.extend_from_slice(format!("Sec-WebSocket-Version: {}\r\n", WS_VERSION).as_bytes());

        if let Some(ref origin) = self.origin {
            buf.extend_from_slice(format!("Origin: {}\r\n", origin).as_bytes());
        }

        if !self.protocols.is_empty() {
            buf.extend_from_slice(
                format!("Sec-WebSocket-Protocol: {}\r\n", self.protocols.join(", ")).as_bytes(),
            );
        }

        buf.extend_from_slice(b"\r\n");
        Ok(())
    }
}

/// Find the end of an HTTP head (the byte after the terminating blank line).
///
/// Accepts both `\r\n` and bare `\n` line endings. Returns `None` until the
/// blank line has arrived.
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    let mut start = 0;
    while let Some(pos) = buf[start..].iter().position(|&b| b == b'\n') {
        let next = start + pos + 1;
        let rest = &buf[next..];
        if rest.starts_with(b"\r\n") {
            return Some(next + 2);
        }
        if rest.starts_with(b"\n") {
            return Some(next + 1);
        }
        start = next;
    }
    None
}

/// Server's response to the upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase following the status code (may be empty).
    pub reason: String,
    /// Response headers.
    pub headers: Headers,
}

impl HandshakeResponse {
    /// Parse an HTTP response head.
    ///
    /// Only the syntax is checked here; status and header semantics are left
    /// to the caller and [`validate_server_headers`](super::validate_server_headers).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResponseParse`] if:
    /// - The data is not valid UTF-8.
    /// - The status line is missing or is not `HTTP/1.x <3-digit code> [reason]`.
    /// - A header line has no `:` or an empty name.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::ResponseParse("Invalid UTF-8".into()))?;

        let mut lines = text.lines();

        // Parse status line: "HTTP/1.1 101 Switching Protocols"
        let status_line = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or_else(|| Error::ResponseParse("Empty response".into()))?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/1.") {
            return Err(Error::ResponseParse(format!(
                "Unsupported HTTP version: {}",
                version
            )));
        }

        let code = parts.next().unwrap_or_default();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::ResponseParse(format!(
                "Invalid status code: {:?}",
                code
            )));
        }
        let status: u16 = code
            .parse()
            .map_err(|_| Error::ResponseParse(format!("Invalid status code: {:?}", code)))?;
        let reason = parts.next().unwrap_or_default().trim().to_string();

        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| Error::ResponseParse(format!("Malformed header line: {:?}", line)))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::ResponseParse("Empty header name".into()));
            }
            headers.append(name, value.trim());
        }

        Ok(Self {
            status,
            reason,
            headers,
        })
    }

    /// `true` for `101 Switching Protocols`.
    #[must_use]
    pub fn is_switching_protocols(&self) -> bool {
        self.status == 101
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_accept_key_rfc_example() {
        // RFC 6455 Section 1.3 example
        let key = "dGhlIHNhbXBsZSBub25jZQ==";
        let expected = "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=";
        assert_eq!(compute_accept_key(key), expected);
    }

    #[test]
    fn test_accept_digest_matches_encoded_form() {
        let key = "dGhlIHNhbXBsZSBub25jZQ==";
        let digest = accept_digest(key);
        assert_eq!(BASE64.encode(digest), compute_accept_key(key));
    }

    #[test]
    fn test_request_write() {
        let req = ClientRequest::new(
            "/chat?room=1",
            "server.example.com:8080",
            "dGhlIHNhbXBsZSBub25jZQ==",
        );

        let mut buf = Vec::new();
        req.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("GET /chat?room=1 HTTP/1.1\r\n"));
        assert!(text.contains("Host: server.example.com:8080\r\n"));
        assert!(text.contains("Upgrade: websocket\r\n"));
        assert!(text.contains("Connection: Upgrade\r\n"));
        assert!(text.contains("Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n"));
        assert!(text.contains("Sec-WebSocket-Version: 13\r\n"));
        assert!(!text.contains("Origin"));
        assert!(!text.contains("Sec-WebSocket-Protocol"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_request_write_optional_headers() {
        let req = ClientRequest {
            origin: Some("http://example.com".to_string()),
            protocols: vec!["chat".to_string(), "superchat".to_string()],
            ..ClientRequest::new("/", "example.com", "dGhlIHNhbXBsZSBub25jZQ==")
        };

        let mut buf = Vec::new();
        req.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Origin: http://example.com\r\n"));
        assert!(text.contains("Sec-WebSocket-Protocol: chat, superchat\r\n"));
    }

    #[test]
    fn test_crlf_in_origin_rejected() {
        let req = ClientRequest {
            origin: Some("http://a\r\nX-Injected: evil".to_string()),
            ..ClientRequest::new("/", "example.com", "dGhlIHNhbXBsZSBub25jZQ==")
        };
        let mut buf = Vec::new();
        let result = req.write(&mut buf);
        assert!(matches!(result, Err(Error::InvalidHeaderValue { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_crlf_in_protocol_rejected() {
        let req = ClientRequest {
            protocols: vec!["chat\nX-Evil: bad".to_string()],
            ..ClientRequest::new("/", "example.com", "dGhlIHNhbXBsZSBub25jZQ==")
        };
        let mut buf = Vec::new();
        let result = req.write(&mut buf);
        assert!(matches!(result, Err(Error::InvalidHeaderValue { .. })));
    }

    #[test]
    fn test_parse_response() {
        let response = b"HTTP/1.1 101 Switching Protocols\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n\
            Sec-WebSocket-Protocol: chat\r\n\
            \r\n";

        let resp = HandshakeResponse::parse(response).unwrap();
        assert_eq!(resp.status, 101);
        assert_eq!(resp.reason, "Switching Protocols");
        assert!(resp.is_switching_protocols());
        assert_eq!(resp.headers.len(), 4);
        assert_eq!(
            resp.headers.get("sec-websocket-accept"),
            Some("s3pPLMBiTxaQ9kYGzzhZRbK+xOo=")
        );
        assert_eq!(resp.headers.get("SEC-WEBSOCKET-PROTOCOL"), Some("chat"));
    }

    #[test]
    fn test_parse_non_101_response() {
        let response = b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
        let resp = HandshakeResponse::parse(response).unwrap();
        assert_eq!(resp.status, 200);
        assert!(!resp.is_switching_protocols());
    }

    #[test]
    fn test_parse_response_without_reason() {
        let resp = HandshakeResponse::parse(b"HTTP/1.0 101\r\n\r\n").unwrap();
        assert_eq!(resp.status, 101);
        assert_eq!(resp.reason, "");
        assert!(resp.headers.is_empty());
    }

    #[test]
    fn test_parse_response_bare_lf() {
        let response = b"HTTP/1.1 101 Switching Protocols\nUpgrade: websocket\n\n";
        let resp = HandshakeResponse::parse(response).unwrap();
        assert_eq!(resp.headers.get("upgrade"), Some("websocket"));
    }

    #[test]
    fn test_parse_response_empty() {
        let result = HandshakeResponse::parse(b"");
        assert!(matches!(result, Err(Error::ResponseParse(msg)) if msg.contains("Empty")));
    }

    #[test]
    fn test_parse_response_bad_version() {
        let result = HandshakeResponse::parse(b"SPDY/3 101 Switching\r\n\r\n");
        assert!(matches!(result, Err(Error::ResponseParse(msg)) if msg.contains("version")));
    }

    #[test]
    fn test_parse_response_bad_status() {
        for line in [
            "HTTP/1.1 1O1 Switching\r\n\r\n",
            "HTTP/1.1 10 Switching\r\n\r\n",
            "HTTP/1.1\r\n\r\n",
        ] {
            let result = HandshakeResponse::parse(line.as_bytes());
            assert!(
                matches!(result, Err(Error::ResponseParse(ref msg)) if msg.contains("status")),
                "{:?} -> {:?}",
                line,
                result
            );
        }
    }

    #[test]
    fn test_parse_response_malformed_header() {
        let response = b"HTTP/1.1 101 Switching Protocols\r\nUpgrade websocket\r\n\r\n";
        let result = HandshakeResponse::parse(response);
        assert!(matches!(result, Err(Error::ResponseParse(msg)) if msg.contains("header")));
    }

    #[test]
    fn test_parse_response_invalid_utf8() {
        let result = HandshakeResponse::parse(b"HTTP/1.1 101 \xff\xfe\r\n\r\n");
        assert!(matches!(result, Err(Error::ResponseParse(msg)) if msg.contains("UTF-8")));
    }

    #[test]
    fn test_headers_first_value_wins() {
        let headers: Headers = [("Upgrade", "websocket"), ("upgrade", "h2c")]
            .into_iter()
            .collect();
        assert_eq!(headers.get("UPGRADE"), Some("websocket"));
        assert_eq!(headers.get("connection"), None);
    }

    #[test]
    fn test_find_head_end() {
        assert_eq!(find_head_end(b"HTTP/1.1 101\r\n\r\n"), Some(16));
        assert_eq!(find_head_end(b"HTTP/1.1 101\r\nA: b\r\n\r\nrest"), Some(22));
        assert_eq!(find_head_end(b"HTTP/1.1 101\n\nrest"), Some(14));
        assert_eq!(find_head_end(b"HTTP/1.1 101\r\nA: b\r\n"), None);
        assert_eq!(find_head_end(b"HTTP/1.1 101\r\nA: b\r\n\r"), None);
        assert_eq!(find_head_end(b""), None);
    }
}
