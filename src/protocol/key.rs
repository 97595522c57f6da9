//! Sec-WebSocket-Key generation.
//!
//! The nonce comes from a [`KeySource`] so tests can pin it while production
//! code draws from the operating system's CSPRNG.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::error::Result;

/// Length of the raw Sec-WebSocket-Key nonce in bytes.
pub const KEY_LEN: usize = 16;

/// Source of handshake nonces.
pub trait KeySource: Send + Sync {
    /// Fill `nonce` with fresh, unpredictable bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Random`](crate::Error::Random) if no randomness is available.
    fn fill(&self, nonce: &mut [u8; KEY_LEN]) -> Result<()>;
}

/// Operating system CSPRNG via `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl KeySource for OsRandom {
    fn fill(&self, nonce: &mut [u8; KEY_LEN]) -> Result<()> {
        getrandom::getrandom(nonce)?;
        Ok(())
    }
}

/// Always yields the same nonce. Only useful for reproducible tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedKey(pub [u8; KEY_LEN]);

impl KeySource for FixedKey {
    fn fill(&self, nonce: &mut [u8; KEY_LEN]) -> Result<()> {
        *nonce = self.0;
        Ok(())
    }
}

/// Draw a nonce from `source` and return it base64-encoded.
///
/// # Errors
///
/// Propagates the source's failure.
pub fn generate_key(source: &dyn KeySource) -> Result<String> {
    let mut nonce = [0u8; KEY_LEN];
    source.fill(&mut nonce)?;
    Ok(BASE64.encode(nonce))
}
