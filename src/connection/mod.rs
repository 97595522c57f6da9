//! The established connection handed over by a successful handshake.
//!
//! ## Connection Lifecycle
//!
//! 1. **Open** - Initial state after successful handshake
//! 2. **Closing** - Local close in progress
//! 3. **Closed** - Connection fully closed, close code recorded
//!
//! A [`Connection`] is never built for a handshake that failed validation;
//! the negotiator shuts such streams down itself.

mod state;

pub use state::ConnectionState;

#[allow(clippy::module_inception)]
mod connection;

pub use connection::Connection;
