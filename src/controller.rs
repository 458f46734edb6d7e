//! The metadata controller: translates key-level `set`/`get`/`remove`
//! into chain and reclaimable-index mutations, and owns the key→node
//! map.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::index::ReclaimableIndex;
use crate::node::{Chain, NodeId};
use crate::persistence::MetadataDocument;

pub struct MetadataController {
    chain: Chain,
    index: ReclaimableIndex,
    keys: HashMap<String, NodeId>,
}

impl MetadataController {
    /// The empty state: no nodes, no keys, `file_size() == 0`.
    pub fn new() -> MetadataController {
        MetadataController {
            chain: Chain::new(),
            index: ReclaimableIndex::new(),
            keys: HashMap::new(),
        }
    }

    pub fn file_size(&self) -> u64 {
        self.chain.file_size()
    }

    /// Dispatch a `set` by the three-way IN_PLACE / RELOCATE / ADD_NEW
    /// rule described in the design doc, returning the byte range the
    /// caller must write the encoded value into.
    pub fn set(&mut self, key: &str, value_size: u64) -> (u64, u64) {
        if let Some(&id) = self.keys.get(key) {
            if value_size <= self.chain.get(id).capacity() {
                // IN_PLACE
                self.chain.get_mut(id).value_size = value_size;
                let start = self.chain.get(id).start;
                return (start, start + value_size);
            }
            // RELOCATE: free the old node before allocating the new one.
            self.chain.get_mut(id).is_live = false;
            self.index.insert(id, &mut self.chain);
        }
        // ADD_NEW
        let id = self.add_new(value_size);
        self.keys.insert(key.to_string(), id);
        let node = self.chain.get(id);
        (node.start, node.start + node.value_size)
    }

    fn add_new(&mut self, value_size: u64) -> NodeId {
        match self.index.find(value_size, &self.chain) {
            Some((pos, _)) => {
                let id = self.index.pop(pos);
                let node = self.chain.get_mut(id);
                node.is_live = true;
                node.value_size = value_size;
                id
            }
            None => self.chain.append(value_size),
        }
    }

    /// Byte range holding `key`'s live value, or `None` if unknown.
    pub fn get(&self, key: &str) -> Option<(u64, u64)> {
        let id = *self.keys.get(key)?;
        let node = self.chain.get(id);
        Some((node.start, node.start + node.value_size))
    }

    /// Remove `key`, reclaiming its node. Fails with `UnknownKey` if the
    /// key is not present.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        let id = self
            .keys
            .remove(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))?;
        self.chain.get_mut(id).is_live = false;
        self.index.insert(id, &mut self.chain);
        Ok(())
    }

    /// Serialize the entire metadata state to its persisted form.
    pub fn to_document(&self) -> MetadataDocument {
        MetadataDocument::from_controller(self)
    }

    /// Rebuild a controller from a persisted document, re-asserting the
    /// chain/index invariants.
    pub fn from_document(doc: MetadataDocument) -> Result<MetadataController> {
        doc.into_controller()
    }

    /// Rehydrate a controller straight from the bytes read off the
    /// metadata file. An empty slice is the empty state; anything else
    /// that fails to decode or validate is `MetadataCorrupt`.
    pub fn load(bytes: &[u8]) -> Result<MetadataController> {
        MetadataController::from_document(MetadataDocument::decode(bytes)?)
    }

    /// Encode the current state to the bytes that should be written to
    /// the metadata file.
    pub fn save(&self) -> Result<Vec<u8>> {
        self.to_document().encode()
    }

    pub(crate) fn chain(&self) -> &Chain {
        &self.chain
    }

    pub(crate) fn index(&self) -> &ReclaimableIndex {
        &self.index
    }

    pub(crate) fn keys(&self) -> &HashMap<String, NodeId> {
        &self.keys
    }

    pub(crate) fn from_parts(
        chain: Chain,
        index: ReclaimableIndex,
        keys: HashMap<String, NodeId>,
    ) -> MetadataController {
        MetadataController { chain, index, keys }
    }
}

impl Default for MetadataController {
    fn default() -> MetadataController {
        MetadataController::new()
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
