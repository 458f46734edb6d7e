//! The size-ordered reclaimable index and its coalescing logic.
//!
//! A plain sorted `Vec<NodeId>` is used rather than a balanced tree:
//! binary-search lookup over a sorted vector is simple and the shift
//! cost of insert/remove is acceptable at the scale this store targets.
//! Ties on `capacity` are broken by walking forward from the leftmost
//! match, which keeps lookup/removal by identity correct even when
//! several entries share a capacity.

use crate::error::{Error, Result};
use crate::node::{Chain, NodeId};

#[derive(Default)]
pub(crate) struct ReclaimableIndex {
    entries: Vec<NodeId>,
}

impl ReclaimableIndex {
    pub fn new() -> ReclaimableIndex {
        ReclaimableIndex { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries.iter().copied()
    }

    /// Lowest-capacity reclaimable node whose capacity is `>= min_size`.
    pub fn find(&self, min_size: u64, chain: &Chain) -> Option<(usize, NodeId)> {
        let pos = self
            .entries
            .partition_point(|&id| chain.get(id).capacity() < min_size);
        self.entries.get(pos).map(|&id| (pos, id))
    }

    /// Remove and return the entry at `position`.
    pub fn pop(&mut self, position: usize) -> NodeId {
        self.entries.remove(position)
    }

    /// Binary search by capacity to the leftmost tie, then scan forward
    /// for identity equality.
    fn find_index_of(&self, id: NodeId, chain: &Chain) -> Option<usize> {
        let capacity = chain.get(id).capacity();
        let mut pos = self
            .entries
            .partition_point(|&other| chain.get(other).capacity() < capacity);
        while pos < self.entries.len() && chain.get(self.entries[pos]).capacity() == capacity {
            if self.entries[pos] == id {
                return Some(pos);
            }
            pos += 1;
        }
        None
    }

    fn sorted_insert(&mut self, id: NodeId, chain: &Chain) {
        let capacity = chain.get(id).capacity();
        let pos = self
            .entries
            .partition_point(|&other| chain.get(other).capacity() < capacity);
        self.entries.insert(pos, id);
    }

    /// Append `id` to the index without sorting or coalescing. Only
    /// used while rehydrating a persisted document; the caller is
    /// responsible for validating sort order afterwards.
    pub(crate) fn raw_push(&mut self, id: NodeId) {
        self.entries.push(id);
    }

    pub fn remove(&mut self, id: NodeId, chain: &Chain) -> Result<()> {
        match self.find_index_of(id, chain) {
            Some(pos) => {
                self.entries.remove(pos);
                Ok(())
            }
            None => Err(Error::NotInIndex(format!("{:?} not in reclaimable index", id))),
        }
    }

    /// Insert `id` (already `is_live == false` and linked into `chain`)
    /// and fuse it with any spatially adjacent reclaimable neighbors.
    ///
    /// Walks `prev`/`next` from `id` to find the farthest reclaimable
    /// neighbors on each side, splices them into a single node retaining
    /// `id`'s identity, and frees the absorbed nodes' arena slots.
    pub fn insert(&mut self, id: NodeId, chain: &mut Chain) {
        self.sorted_insert(id, chain);

        let mut left_edge = id;
        while let Some(prev) = chain.get(left_edge).prev {
            if chain.get(prev).is_live {
                break;
            }
            left_edge = prev;
        }

        let mut right_edge = id;
        while let Some(next) = chain.get(right_edge).next {
            if chain.get(next).is_live {
                break;
            }
            right_edge = next;
        }

        if left_edge == id && right_edge == id {
            return;
        }

        // Collect the absorbed span (everything from left_edge to
        // right_edge, inclusive) while the old links are still intact.
        let mut absorbed = Vec::new();
        let mut cur = left_edge;
        loop {
            if cur != id {
                absorbed.push(cur);
            }
            if cur == right_edge {
                break;
            }
            cur = chain.get(cur).next.expect("coalescing span must be contiguous");
        }

        let new_start = chain.get(left_edge).start;
        let new_end = chain.get(right_edge).end;
        let new_prev = chain.get(left_edge).prev;
        let new_next = chain.get(right_edge).next;

        for &absorbed_id in &absorbed {
            self.remove(absorbed_id, chain)
                .expect("absorbed node must be in the reclaimable index");
        }
        // `id`'s capacity is about to change; remove and re-insert so
        // its position in the size-ordered sequence stays correct.
        self.remove(id, chain).expect("id must still be indexed");

        {
            let node = chain.get_mut(id);
            node.start = new_start;
            node.end = new_end;
            node.prev = new_prev;
            node.next = new_next;
        }
        match new_prev {
            Some(p) => chain.get_mut(p).next = Some(id),
            None => {}
        }
        match new_next {
            Some(n) => chain.get_mut(n).prev = Some(id),
            None => chain.set_tail(Some(id)),
        }

        self.sorted_insert(id, chain);

        for absorbed_id in absorbed {
            chain.free(absorbed_id);
        }
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
