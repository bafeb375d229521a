//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The work factor is fixed by the store file format: every store is
//! derived with `KDF_ITERATIONS` rounds, so there is nothing to record
//! on disk besides the salt.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::Sha256;

use crate::errors::{KeyTreeError, Result};

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the salt in bytes. Same as the key length.
pub const SALT_LEN: usize = KEY_LEN;

/// PBKDF2 iteration count used for every store.
pub const KDF_ITERATIONS: u32 = 10_000;

/// Derive a 32-byte key from a password and salt.
///
/// Deterministic: the same password + salt always yields the same key.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    derive_key_with_iterations(password, salt, KDF_ITERATIONS)
}

/// Derive a 32-byte key with an explicit iteration count.
pub fn derive_key_with_iterations(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<[u8; KEY_LEN]> {
    if iterations < 1 {
        return Err(KeyTreeError::KeyDerivationFailed(
            "PBKDF2 iterations must be at least 1".into(),
        ));
    }
    if salt.len() != SALT_LEN {
        return Err(KeyTreeError::KeyDerivationFailed(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(key)
}

/// Generate a cryptographically random salt from the OS RNG.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| KeyTreeError::KeyDerivationFailed(format!("OS RNG unavailable: {e}")))?;
    Ok(salt)
}
