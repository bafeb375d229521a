//! On-disk store file layout.
//!
//! A store file is raw byte concatenation:
//!
//! ```text
//! [salt: 32 bytes][IV: 16 bytes][AES-256-CBC ciphertext of the tree payload]
//! ```
//!
//! The salt is the only plaintext field.  Everything after it is the
//! envelope blob produced by `crypto::encrypt`; the payload's schema
//! version lives inside the encrypted part (see `tree::codec`).

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::crypto::SALT_LEN;
use crate::errors::{KeyTreeError, Result};

/// Raw contents of a store file, split into its two parts.
pub struct RawStore {
    /// Salt used to derive the key for this file.
    pub salt: [u8; SALT_LEN],
    /// IV || ciphertext.
    pub blob: Vec<u8>,
}

/// Read a store file and split off the leading salt.
pub fn read_store(path: &Path) -> Result<RawStore> {
    let data = fs::read(path)?;

    if data.len() < SALT_LEN {
        return Err(KeyTreeError::InvalidStoreFormat(format!(
            "file is {} bytes, shorter than the {SALT_LEN}-byte salt",
            data.len()
        )));
    }

    let (salt_bytes, blob) = data.split_at(SALT_LEN);
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(salt_bytes);

    Ok(RawStore {
        salt,
        blob: blob.to_vec(),
    })
}

/// Write `salt || blob` to `path` as a single whole-file overwrite.
///
/// Missing parent directories are created first.  On Unix the file is
/// restricted to owner read/write.
///
/// The write is not atomic: a crash part-way through leaves a
/// truncated file behind.
pub fn write_store(path: &Path, salt: &[u8; SALT_LEN], blob: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut buf = Vec::with_capacity(SALT_LEN + blob.len());
    buf.extend_from_slice(salt);
    buf.extend_from_slice(blob);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(&buf)?;
    file.sync_all()?;

    // `mode` only applies when the file is created; tighten existing files too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read_splits_salt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.ktree");
        let salt = [5u8; SALT_LEN];

        write_store(&path, &salt, b"blob-bytes").unwrap();
        let raw = read_store(&path).unwrap();
        assert_eq!(raw.salt, salt);
        assert_eq!(raw.blob, b"blob-bytes");
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/s.ktree");
        write_store(&path, &[0u8; SALT_LEN], b"x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn short_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.ktree");
        fs::write(&path, [0u8; 10]).unwrap();
        assert!(matches!(
            read_store(&path),
            Err(KeyTreeError::InvalidStoreFormat(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn existing_file_permissions_are_tightened() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loose.ktree");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_store(&path, &[1u8; SALT_LEN], b"new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
