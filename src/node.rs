//! The node data model and the doubly-linked node chain.
//!
//! Nodes live in a slab arena (`Vec<Option<NodeData>>`) addressed by
//! `NodeId`, rather than behind `Rc<RefCell<_>>`. The chain and the
//! reclaimable index both hold `NodeId`s into the same arena, so the
//! adjacency graph can be spliced without fighting the borrow checker
//! or paying reference-counting overhead.

/// Stable handle into the node arena. Never reused while the node it
/// named is still reachable from the chain or the reclaimable index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub start: u64,
    pub end: u64,
    pub value_size: u64,
    pub is_live: bool,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

impl NodeData {
    pub fn capacity(&self) -> u64 {
        self.end - self.start
    }
}

/// The arena plus the doubly-linked ordering of all nodes by file
/// offset. Owns every `NodeData` reachable from either the chain or the
/// reclaimable index.
#[derive(Default)]
pub(crate) struct Chain {
    arena: Vec<Option<NodeData>>,
    free_slots: Vec<u32>,
    tail: Option<NodeId>,
}

impl Chain {
    pub fn new() -> Chain {
        Chain {
            arena: Vec::new(),
            free_slots: Vec::new(),
            tail: None,
        }
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id.0 as usize]
            .as_ref()
            .expect("dangling NodeId")
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id.0 as usize]
            .as_mut()
            .expect("dangling NodeId")
    }

    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    pub fn file_size(&self) -> u64 {
        match self.tail {
            Some(id) => self.get(id).end,
            None => 0,
        }
    }

    /// Allocate a brand new live node of `capacity` bytes at the end of
    /// the values file.
    pub fn append(&mut self, capacity: u64) -> NodeId {
        let start = self.file_size();
        let prev = self.tail;
        let id = self.insert_slot(NodeData {
            start,
            end: start + capacity,
            value_size: 0,
            is_live: true,
            prev,
            next: None,
        });
        if let Some(prev) = prev {
            self.get_mut(prev).next = Some(id);
        }
        self.tail = Some(id);
        id
    }

    /// Insert a pre-built node into the arena, wiring `prev`/`next` as
    /// given. Used when rebuilding a chain from persisted metadata.
    pub(crate) fn insert_built(&mut self, node: NodeData) -> NodeId {
        self.insert_slot(node)
    }

    pub(crate) fn set_tail(&mut self, id: Option<NodeId>) {
        self.tail = id;
    }

    /// Remove a node's arena slot entirely. Callers must have already
    /// unlinked it from any `prev`/`next` neighbors and from the
    /// reclaimable index.
    pub(crate) fn free(&mut self, id: NodeId) {
        self.arena[id.0 as usize] = None;
        self.free_slots.push(id.0);
    }

    fn insert_slot(&mut self, node: NodeData) -> NodeId {
        if let Some(slot) = self.free_slots.pop() {
            self.arena[slot as usize] = Some(node);
            NodeId(slot)
        } else {
            self.arena.push(Some(node));
            NodeId((self.arena.len() - 1) as u32)
        }
    }

    /// Iterate all live arena slots in ascending `start` order, starting
    /// from the head of the chain. Used by persistence and validation.
    pub(crate) fn iter_chain(&self) -> ChainIter<'_> {
        let head = self.find_head();
        ChainIter { chain: self, cur: head }
    }

    fn find_head(&self) -> Option<NodeId> {
        let mut cur = self.tail?;
        loop {
            match self.get(cur).prev {
                Some(prev) => cur = prev,
                None => return Some(cur),
            }
        }
    }
}

pub(crate) struct ChainIter<'a> {
    chain: &'a Chain,
    cur: Option<NodeId>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.cur?;
        self.cur = self.chain.get(cur).next;
        Some(cur)
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
