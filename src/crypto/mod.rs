//! Cryptographic primitives for KeyTree.
//!
//! This module provides:
//! - AES-256-CBC encryption and decryption of opaque blobs (`encryption`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - A zeroize-on-drop holder for the derived key (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, IV_LEN};
pub use kdf::{
    derive_key, derive_key_with_iterations, generate_salt, KDF_ITERATIONS, KEY_LEN, SALT_LEN,
};
pub use keys::MasterKey;
