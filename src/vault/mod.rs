//! Vault module: the encrypted secret store.
//!
//! This module provides:
//! - The on-disk `salt || IV || ciphertext` layout (`format`)
//! - High-level `SecretStore` for opening, mutating, rotating and
//!   flushing a store (`store`)

pub mod format;
pub mod store;

// Re-export the most commonly used items.
pub use store::{DeleteOutcome, SecretStore};
