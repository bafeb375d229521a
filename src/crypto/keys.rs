//! In-memory key holder.

use zeroize::Zeroize;

use super::kdf::{derive_key, KEY_LEN};
use crate::errors::Result;

/// A wrapper around the 32-byte store key that automatically zeroes
/// its memory when dropped.
///
/// The key is never persisted; it lives only as long as the open store.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct MasterKey {
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    /// Create a new `MasterKey` from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Derive a key from `password` and `salt`, zeroizing the
    /// intermediate buffer.
    pub fn derive(password: &[u8], salt: &[u8]) -> Result<Self> {
        let mut raw = derive_key(password, salt)?;
        let key = Self::new(raw);
        raw.zeroize();
        Ok(key)
    }

    /// Access the raw key bytes (e.g. to pass to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}
