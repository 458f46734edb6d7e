//! `Store`: the public key-value facade. Combines the metadata
//! controller, the values file and the metadata file behind a single
//! `RwLock`, encoding/decoding values as JSON the way the original
//! source's `PersistentDict` does.

use std::sync::{Mutex, RwLock};

use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::controller::MetadataController;
use crate::error::{Error, Result};
use crate::storage::{self, ValuesFile};

struct Inner {
    controller: MetadataController,
    // A separate `Mutex` (rather than folding the file into the outer
    // lock) lets `get` hold only a read guard on `Inner` for its whole
    // duration: the key's byte range is looked up and the bytes are
    // read back without ever releasing and re-acquiring a lock, so no
    // concurrent `set`/`remove` can relocate or reclaim the node in
    // between.
    values: Mutex<ValuesFile>,
    config: Config,
}

/// An embedded, persistent `String -> JSON value` store.
///
/// All operations are serialized behind a single reader/writer lock:
/// any number of concurrent `get`s may run together (serializing only
/// briefly on the internal values-file mutex while bytes are actually
/// read), but `set` and `remove` each take the lock exclusively. See
/// the crate-level design doc for the allocator this store is built
/// around.
pub struct Store {
    inner: RwLock<Option<Inner>>,
}

impl Store {
    /// Open (or create) a store at the paths named by `config`,
    /// rehydrating metadata from disk if a metadata file already
    /// exists.
    pub fn open(config: Config) -> Result<Store> {
        let metadata_bytes = storage::read_whole_file(&config.metadata_path)?;
        let controller = MetadataController::load(&metadata_bytes)?;
        let values = ValuesFile::open(&config.values_path, config.sync_on_write)?;

        Ok(Store {
            inner: RwLock::new(Some(Inner {
                controller,
                values: Mutex::new(values),
                config,
            })),
        })
    }

    /// Look up `key`, JSON-decoding its value. Returns `None` if the key
    /// is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let guard = self.inner.read().expect("rwlock poisoned");
        let inner = guard.as_ref().ok_or_else(|| Error::HandleClosed("get".to_string()))?;

        let (start, end) = match inner.controller.get(key) {
            Some(range) => range,
            None => return Ok(None),
        };

        let mut values = inner.values.lock().expect("values mutex poisoned");
        values.seek(start)?;
        let bytes = values.read(end - start)?;
        drop(values);

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                error!(target: "nodekv", "decode failure for key {:?}: {}", key, err);
                Err(Error::from(err))
            }
        }
    }

    /// Encode `value` as JSON and store it under `key`, persisting
    /// metadata afterwards.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;

        let mut guard = self.inner.write().expect("rwlock poisoned");
        let inner = guard.as_mut().ok_or_else(|| Error::HandleClosed("set".to_string()))?;

        let had_key = inner.controller.get(key).is_some();
        let (start, end) = inner.controller.set(key, bytes.len() as u64);
        if had_key && end - start < bytes.len() as u64 {
            warn!(target: "nodekv", "relocated key {:?}, old node abandoned", key);
        }

        let mut values = inner.values.lock().expect("values mutex poisoned");
        values.seek(start)?;
        values.write(&bytes)?;
        values.flush()?;
        drop(values);

        Self::persist(inner)?;
        debug!(target: "nodekv", "set {:?} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Remove `key`. Fails with `UnknownKey` if the key is not present.
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        let inner = guard.as_mut().ok_or_else(|| Error::HandleClosed("remove".to_string()))?;

        inner.controller.remove(key)?;
        Self::persist(inner)?;
        debug!(target: "nodekv", "removed {:?}", key);
        Ok(())
    }

    /// Close both streams. Any operation after `close` fails with
    /// `HandleClosed`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.inner.write().expect("rwlock poisoned");
        if let Some(inner) = guard.take() {
            inner.values.lock().expect("values mutex poisoned").close();
            debug!(target: "nodekv", "store closed");
        }
        Ok(())
    }

    fn persist(inner: &Inner) -> Result<()> {
        let bytes = inner.controller.save()?;
        storage::write_whole_file(&inner.config.metadata_path, &bytes, inner.config.sync_on_write)
    }
}
