use thiserror::Error;

/// All errors that can occur in KeyTree.
#[derive(Debug, Error)]
pub enum KeyTreeError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong password or corrupted store")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Store errors ---
    #[error("Invalid store format: {0}")]
    InvalidStoreFormat(String),

    #[error("Unsupported store schema version {0}")]
    UnsupportedVersion(u8),

    #[error("Rotation aborted: value at '{0}' could not be decrypted")]
    RotationFailed(String),

    // --- Tree errors ---
    #[error("Invalid path '{0}'")]
    InvalidPath(String),

    #[error("No entry at '{0}'")]
    PathNotFound(String),

    #[error("No secret set at '{0}'")]
    EmptyValue(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Unknown command '{0}' (type `help` for a list)")]
    UnknownCommand(String),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    #[error("No input for {0}s, exiting")]
    InputTimeout(u64),
}

/// Convenience type alias for KeyTree results.
pub type Result<T> = std::result::Result<T, KeyTreeError>;
