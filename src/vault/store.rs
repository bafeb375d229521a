//! High-level store operations used by CLI commands.
//!
//! `SecretStore` ties together the file envelope, the crypto layer and
//! the in-memory tree so the rest of the application can work with
//! simple calls like `store.set("email/gmail", "hunter2")`.
//!
//! Lifecycle: `open` either loads and decrypts an existing file or
//! starts a fresh, empty tree (nothing is written until `flush`).
//! Mutations only touch memory; `flush` is the single way to persist.
//! `close` consumes the store, so no operation can follow it.

use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{decrypt, encrypt, generate_salt, MasterKey, SALT_LEN};
use crate::errors::{KeyTreeError, Result};
use crate::tree::node::Iter;
use crate::tree::{codec, SecretTree};

use super::format;

/// What `smart_delete` did to the addressed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The node held a value; the value was cleared and children kept.
    ClearedValue,
    /// The node held no value; it was detached with its subtree.
    RemovedNode,
}

/// An open secret store.
pub struct SecretStore {
    /// Path to the store file on disk.
    path: PathBuf,

    /// Salt persisted at the head of the file.
    salt: [u8; SALT_LEN],

    /// Key derived from the password and salt (zeroized on drop).
    key: MasterKey,

    /// Tree of encrypted values (wiped on drop).
    tree: SecretTree,

    /// No file existed when the store was opened.
    is_new: bool,

    /// In-memory state differs from what is on disk.
    dirty: bool,
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore")
            .field("path", &self.path)
            .field("nodes", &self.tree.len())
            .field("is_new", &self.is_new)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl SecretStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open the store at `path` with `password`.
    ///
    /// If no file exists this is a first-time initialization: a fresh
    /// salt is generated, the tree starts empty, and nothing is written
    /// until the first `flush`.
    ///
    /// If the file exists, its salt is read back, the key is derived and
    /// the payload decrypted.  A bad password surfaces as
    /// `DecryptionFailed`; retrying with another password is the
    /// caller's job.
    pub fn open(path: &Path, password: &[u8]) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no store file, initializing a new store");
            let salt = generate_salt()?;
            let key = MasterKey::derive(password, &salt)?;
            return Ok(Self {
                path: path.to_path_buf(),
                salt,
                key,
                tree: SecretTree::new(),
                is_new: true,
                dirty: false,
            });
        }

        debug!(path = %path.display(), "loading store");
        let raw = format::read_store(path)?;
        let key = MasterKey::derive(password, &raw.salt)?;

        let payload = Zeroizing::new(decrypt(key.as_bytes(), &raw.blob)?);

        // Valid padding under a wrong key still yields garbage without
        // the magic bytes; report it like a padding failure so the
        // caller re-prompts.  Past the magic the key is right, and any
        // codec error (newer schema, corruption) is returned as is.
        if !codec::has_magic(&payload) {
            debug!("payload decrypted but carries no magic bytes");
            return Err(KeyTreeError::DecryptionFailed);
        }
        let (tree, version) = codec::decode(&payload)?;

        let migrated = version != codec::CURRENT_VERSION;
        if migrated {
            info!(
                from = version,
                to = codec::CURRENT_VERSION,
                "migrating store schema on next flush"
            );
        }
        debug!(nodes = tree.len(), "store loaded");

        Ok(Self {
            path: path.to_path_buf(),
            salt: raw.salt,
            key,
            tree,
            is_new: false,
            dirty: migrated,
        })
    }

    // ------------------------------------------------------------------
    // Path operations
    // ------------------------------------------------------------------

    /// Decrypt and return the secret stored at `path`.
    pub fn get(&self, path: &str) -> Result<String> {
        let node = self
            .tree
            .descendant(path)?
            .ok_or_else(|| KeyTreeError::PathNotFound(path.to_string()))?;
        let blob = node
            .value()
            .ok_or_else(|| KeyTreeError::EmptyValue(path.to_string()))?;

        let plaintext = decrypt(self.key.as_bytes(), blob)?;

        // On error, zeroize the bytes inside the error before discarding.
        String::from_utf8(plaintext).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            KeyTreeError::InvalidStoreFormat(format!("secret at '{path}' is not valid UTF-8"))
        })
    }

    /// Encrypt `secret` and store it at `path`, creating any missing
    /// ancestors as empty nodes.
    pub fn set(&mut self, path: &str, secret: &str) -> Result<()> {
        let blob = encrypt(self.key.as_bytes(), secret.as_bytes())?;
        let node = self
            .tree
            .descendant_mut(path, true)?
            .ok_or_else(|| KeyTreeError::PathNotFound(path.to_string()))?;
        node.set_value(blob);
        self.dirty = true;
        Ok(())
    }

    /// Detach the node at `path` (and its whole subtree) from its parent.
    ///
    /// This is the raw tree primitive: no pruning happens afterwards.
    pub fn remove(&mut self, path: &str) -> Result<()> {
        let mut detached = self.tree.remove(path)?;
        detached.wipe();
        self.dirty = true;
        Ok(())
    }

    /// Delete with command-level semantics, then prune.
    ///
    /// A node holding a value only loses the value (its children stay);
    /// a valueless node is removed together with its subtree.
    pub fn smart_delete(&mut self, path: &str) -> Result<DeleteOutcome> {
        let node = self
            .tree
            .descendant_mut(path, false)?
            .ok_or_else(|| KeyTreeError::PathNotFound(path.to_string()))?;

        let outcome = if node.has_value() {
            node.clear_value();
            DeleteOutcome::ClearedValue
        } else {
            self.remove(path)?;
            DeleteOutcome::RemovedNode
        };
        self.dirty = true;

        let pruned = self.prune();
        debug!(?outcome, pruned, "smart delete");
        Ok(outcome)
    }

    /// Remove every node that has neither a value nor children,
    /// cascading upward.  Returns how many nodes were removed.
    pub fn prune(&mut self) -> usize {
        let removed = self.tree.prune();
        if removed > 0 {
            self.dirty = true;
            debug!(removed, "pruned empty nodes");
        }
        removed
    }

    /// Depth-first traversal of every node with its still-encrypted value.
    pub fn iterate(&self) -> Iter<'_> {
        self.tree.iter()
    }

    /// Skeleton text of the tree.  Never includes values.
    pub fn render(&self) -> String {
        self.tree.render()
    }

    /// Full paths of every node, depth-first.
    pub fn paths(&self) -> Vec<String> {
        self.tree.iter().map(|e| e.path).collect()
    }

    /// Paths matching `pattern`, a case-insensitive regular expression.
    pub fn search(&self, pattern: &str) -> Result<Vec<String>> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| KeyTreeError::CommandFailed(format!("invalid pattern: {e}")))?;
        Ok(self
            .tree
            .iter()
            .filter(|e| re.is_match(&e.path))
            .map(|e| e.path)
            .collect())
    }

    // ------------------------------------------------------------------
    // Rotation
    // ------------------------------------------------------------------

    /// Re-key the store under `new_password`.
    ///
    /// Every value is decrypted with the current key and re-encrypted
    /// with a key derived from a brand-new salt.  The new blobs are
    /// only written into the tree, and the new key/salt adopted, after
    /// every value has been re-encrypted.  On failure the store is left
    /// exactly as it was.  Call `flush` to persist.
    ///
    /// Returns the number of values re-encrypted.
    pub fn rotate(&mut self, new_password: &[u8]) -> Result<usize> {
        let new_salt = generate_salt()?;
        let new_key = MasterKey::derive(new_password, &new_salt)?;

        let mut reencrypted = Vec::new();
        for entry in self.tree.iter() {
            let Some(blob) = entry.value else {
                continue;
            };
            let plaintext = Zeroizing::new(decrypt(self.key.as_bytes(), blob).map_err(|_| {
                warn!(path = %entry.path, "value failed to decrypt during rotation");
                KeyTreeError::RotationFailed(entry.path.clone())
            })?);
            let fresh = encrypt(new_key.as_bytes(), &plaintext)?;
            reencrypted.push((entry.path, fresh));
        }

        let count = reencrypted.len();
        for (path, blob) in reencrypted {
            if let Some(node) = self.tree.descendant_mut(&path, false)? {
                node.set_value(blob);
            }
        }
        self.key = new_key;
        self.salt = new_salt;
        self.dirty = true;

        info!(reencrypted = count, "store key rotated");
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Serialize the tree, encrypt it under the current key with a
    /// fresh IV, and overwrite the store file with `salt || blob`.
    pub fn flush(&mut self) -> Result<()> {
        let payload = Zeroizing::new(codec::encode(&self.tree)?);
        let blob = encrypt(self.key.as_bytes(), &payload)?;
        format::write_store(&self.path, &self.salt, &blob)?;

        self.is_new = false;
        self.dirty = false;
        debug!(path = %self.path.display(), nodes = self.tree.len(), "store flushed");
        Ok(())
    }

    /// Discard the key and every value held in memory.
    ///
    /// Unflushed changes are lost.
    pub fn close(mut self) {
        if self.dirty {
            warn!(path = %self.path.display(), "closing store with unflushed changes");
        }
        self.tree.wipe();
        debug!(path = %self.path.display(), "store closed");
        // Dropping `self` zeroizes the key.
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` when no file existed at open time and none was flushed yet.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// `true` when there are changes not yet written by `flush`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of nodes in the tree (excluding the root).
    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if a node exists at `path`.
    ///
    /// Metadata only; nothing is decrypted.
    pub fn contains(&self, path: &str) -> bool {
        matches!(self.tree.descendant(path), Ok(Some(_)))
    }

    /// Returns `true` if a node exists at `path` and holds a value.
    pub fn has_value(&self, path: &str) -> bool {
        matches!(self.tree.descendant(path), Ok(Some(node)) if node.has_value())
    }
}
