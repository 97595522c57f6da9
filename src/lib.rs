//! # wsdial - WebSocket client opening handshake
//!
//! `wsdial` upgrades a TCP (or TLS) connection to a WebSocket connection as
//! described in RFC 6455 Section 4.1, and hands the validated stream to
//! whatever framing layer sits on top.
//!
//! ## Features
//!
//! - **Strict key exchange** - the server's `Sec-WebSocket-Accept` is checked
//!   byte-for-byte against SHA-1 of our nonce and the protocol GUID
//! - **No leaked sockets** - every failure path shuts the stream down before
//!   returning
//! - **Injectable randomness** through [`KeySource`]
//! - **TLS** for `wss://` with the `tls-rustls` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let conn = wsdial::open("ws://127.0.0.1:9001/chat").await?;
//! assert!(conn.is_open());
//! ```

pub mod client;
pub mod close;
pub mod config;
pub mod connection;
pub mod error;
pub mod protocol;

#[cfg(feature = "tls-rustls")]
pub mod tls;

pub use client::{Connector, MaybeTlsStream, Target, WebSocketStream, handshake, open};
pub use close::CloseCode;
pub use config::{Config, Timeouts};
pub use connection::{Connection, ConnectionState};
pub use error::{Error, Result};
pub use protocol::{
    FixedKey, HandshakeResponse, Headers, KeySource, OsRandom, WS_GUID, compute_accept_key,
    validate_server_headers,
};
