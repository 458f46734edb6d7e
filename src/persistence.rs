//! Self-describing on-disk form of the metadata controller's state, and
//! the invariant re-assertion run on every load.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::controller::MetadataController;
use crate::error::{Error, Result};
use crate::index::ReclaimableIndex;
use crate::node::{Chain, NodeData, NodeId};

#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct NodeRecord {
    start: u64,
    end: u64,
    value_size: u64,
    is_live: bool,
}

/// The full metadata state as written to the metadata file: `file_size`,
/// the node chain (in ascending-offset order), the key→node-index map,
/// and the reclaimable node indices, all addressing into `chain` by
/// position.
#[derive(Clone, Serialize, Deserialize)]
pub struct MetadataDocument {
    file_size: u64,
    chain: Vec<NodeRecord>,
    keys: HashMap<String, usize>,
    reclaimable: Vec<usize>,
}

impl MetadataDocument {
    pub(crate) fn from_controller(controller: &MetadataController) -> MetadataDocument {
        let chain = controller.chain();

        let mut records = Vec::new();
        let mut id_to_pos = HashMap::new();
        for (pos, id) in chain.iter_chain().enumerate() {
            id_to_pos.insert(id, pos);
            let node = chain.get(id);
            records.push(NodeRecord {
                start: node.start,
                end: node.end,
                value_size: node.value_size,
                is_live: node.is_live,
            });
        }

        let keys = controller
            .keys()
            .iter()
            .map(|(key, id)| (key.clone(), id_to_pos[id]))
            .collect();
        let reclaimable = controller.index().iter().map(|id| id_to_pos[&id]).collect();

        MetadataDocument {
            file_size: chain.file_size(),
            chain: records,
            keys,
            reclaimable,
        }
    }

    pub(crate) fn into_controller(self) -> Result<MetadataController> {
        let mut chain = Chain::new();
        let mut positions: Vec<NodeId> = Vec::with_capacity(self.chain.len());

        for (pos, rec) in self.chain.iter().enumerate() {
            let prev = if pos == 0 { None } else { Some(positions[pos - 1]) };
            let id = chain.insert_built(NodeData {
                start: rec.start,
                end: rec.end,
                value_size: rec.value_size,
                is_live: rec.is_live,
                prev,
                next: None,
            });
            if let Some(p) = prev {
                chain.get_mut(p).next = Some(id);
            }
            positions.push(id);
        }
        if let Some(&last) = positions.last() {
            chain.set_tail(Some(last));
        }

        let resolve = |idx: usize| -> Result<NodeId> {
            positions
                .get(idx)
                .copied()
                .ok_or_else(|| Error::MetadataCorrupt(format!("node index {} out of range", idx)))
        };

        let mut index = ReclaimableIndex::new();
        for idx in self.reclaimable {
            index.raw_push(resolve(idx)?);
        }

        let mut keys = HashMap::new();
        for (key, idx) in self.keys {
            keys.insert(key, resolve(idx)?);
        }

        if chain.file_size() != self.file_size {
            return Err(Error::MetadataCorrupt(format!(
                "file_size mismatch: document says {}, chain computes {}",
                self.file_size,
                chain.file_size()
            )));
        }

        let controller = MetadataController::from_parts(chain, index, keys);
        validate(&controller)?;
        Ok(controller)
    }

    /// Encode to the JSON form persisted to the metadata file, with
    /// stable (sorted) key ordering.
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode a metadata document. An empty byte stream decodes to the
    /// empty controller's document (see `MetadataController::new`); a
    /// non-empty stream that fails to parse is `MetadataCorrupt`.
    pub(crate) fn decode(bytes: &[u8]) -> Result<MetadataDocument> {
        if bytes.is_empty() {
            return Ok(MetadataDocument {
                file_size: 0,
                chain: Vec::new(),
                keys: HashMap::new(),
                reclaimable: Vec::new(),
            });
        }
        serde_json::from_slice(bytes)
            .map_err(|err| Error::MetadataCorrupt(format!("{}", err)))
    }
}

/// Re-assert every §3 invariant over a freshly rehydrated controller.
fn validate(controller: &MetadataController) -> Result<()> {
    let chain = controller.chain();
    let index = controller.index();
    let keys = controller.keys();

    let mut expected_start = 0u64;
    let mut live_ids = HashSet::new();
    let mut reclaimable_ids = HashSet::new();
    let mut prev_is_live: Option<bool> = None;

    for id in chain.iter_chain() {
        let node = chain.get(id);
        if node.start != expected_start {
            return Err(Error::MetadataCorrupt(format!(
                "chain gap: expected start {}, found {}",
                expected_start, node.start
            )));
        }
        if node.end < node.start {
            return Err(Error::MetadataCorrupt("node end precedes start".into()));
        }
        expected_start = node.end;

        if node.is_live {
            live_ids.insert(id);
        } else {
            reclaimable_ids.insert(id);
            if prev_is_live == Some(false) {
                return Err(Error::MetadataCorrupt(
                    "two spatially adjacent reclaimable nodes were not coalesced".into(),
                ));
            }
        }
        prev_is_live = Some(node.is_live);
    }

    let index_ids: HashSet<NodeId> = index.iter().collect();
    if index_ids != reclaimable_ids {
        return Err(Error::MetadataCorrupt(
            "reclaimable index does not match the set of non-live chain nodes".into(),
        ));
    }

    let mut prev_capacity = 0u64;
    for id in index.iter() {
        let capacity = chain.get(id).capacity();
        if capacity < prev_capacity {
            return Err(Error::MetadataCorrupt(
                "reclaimable index is not sorted by capacity".into(),
            ));
        }
        prev_capacity = capacity;
    }

    let mut seen = HashSet::new();
    for id in keys.values() {
        if !live_ids.contains(id) {
            return Err(Error::MetadataCorrupt(
                "key map references a non-live node".into(),
            ));
        }
        if !seen.insert(*id) {
            return Err(Error::MetadataCorrupt(
                "two keys reference the same live node".into(),
            ));
        }
    }
    if seen.len() != live_ids.len() {
        return Err(Error::MetadataCorrupt(
            "a live node is not referenced by any key".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;
