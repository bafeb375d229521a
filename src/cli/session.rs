//! The per-invocation session: the open store plus the settings that
//! govern how commands behave.
//!
//! A `Session` is built once the store is open and handed by `&mut` to
//! every command handler.  Its lifetime is the lifetime of the key.

use std::path::Path;

use crate::config::Settings;
use crate::errors::Result;
use crate::vault::SecretStore;

pub struct Session {
    store: SecretStore,
    settings: Settings,
}

impl Session {
    pub fn new(store: SecretStore, settings: Settings) -> Self {
        Self { store, settings }
    }

    /// Open the store at `path` and wrap it in a session.
    pub fn open(path: &Path, password: &[u8], settings: Settings) -> Result<Self> {
        let store = SecretStore::open(path, password)?;
        Ok(Self::new(store, settings))
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SecretStore {
        &mut self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Persist the store.
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    /// End the session, wiping the key and tree from memory.
    pub fn close(self) {
        self.store.close();
    }
}
