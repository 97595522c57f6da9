//! Validation of the server's handshake response (RFC 6455 Section 4.1).
//!
//! These are pure functions over an explicit header list and key so they can
//! be exercised without any I/O.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::error::{Error, Result};
use crate::protocol::handshake::{CONNECTION_UPGRADE, Headers, UPGRADE_WEBSOCKET, accept_digest};

/// Check the server's response headers against the key the client sent.
///
/// Checks run in order and stop at the first failure:
///
/// 1. `Upgrade` equals `websocket` (ASCII case-insensitive)
/// 2. `Connection` equals `upgrade` (ASCII case-insensitive)
/// 3. `Sec-WebSocket-Accept` decodes from base64
/// 4. the decoded bytes equal SHA-1(`client_key` + GUID)
///
/// Absent headers are treated as empty values.
///
/// # Errors
///
/// - [`Error::UpgradeMismatch`] / [`Error::ConnectionMismatch`] for the header checks
/// - [`Error::InvalidAcceptEncoding`] if the accept value is not base64
/// - [`Error::KeyMismatch`] if the accept value was not derived from `client_key`
pub fn validate_server_headers(headers: &Headers, client_key: &str) -> Result<()> {
    let upgrade = headers.get("Upgrade").unwrap_or_default();
    if !upgrade.eq_ignore_ascii_case(UPGRADE_WEBSOCKET) {
        return Err(Error::UpgradeMismatch);
    }

    let connection = headers.get("Connection").unwrap_or_default();
    if !connection.eq_ignore_ascii_case(CONNECTION_UPGRADE) {
        return Err(Error::ConnectionMismatch);
    }

    let expected = accept_digest(client_key);
    let server = BASE64.decode(headers.get("Sec-WebSocket-Accept").unwrap_or_default())?;
    if server.as_slice() != expected.as_slice() {
        return Err(Error::KeyMismatch);
    }

    Ok(())
}

/// Check the subprotocol the server selected against those offered.
///
/// Returns the selected protocol, or `None` if the server did not pick one.
///
/// # Errors
///
/// Returns [`Error::ProtocolMismatch`] if the server selected a protocol
/// that was not offered (including any selection when nothing was offered).
pub fn validate_protocol(headers: &Headers, offered: &[String]) -> Result<Option<String>> {
    match headers.get("Sec-WebSocket-Protocol") {
        None => Ok(None),
        Some(selected) if offered.iter().any(|p| p == selected) => Ok(Some(selected.to_string())),
        Some(selected) => Err(Error::ProtocolMismatch(selected.to_string())),
    }
}
