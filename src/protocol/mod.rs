//! WebSocket opening handshake, client side (RFC 6455 Section 4).

pub mod handshake;
pub mod key;
pub mod validation;

pub use handshake::{
    ClientRequest, HandshakeResponse, Headers, WS_GUID, accept_digest, compute_accept_key,
};
pub use key::{FixedKey, KeySource, OsRandom, generate_key};
pub use validation::{validate_protocol, validate_server_headers};
