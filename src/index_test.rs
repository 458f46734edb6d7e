use super::*;
use crate::node::NodeData;

fn capacities(index: &ReclaimableIndex, chain: &Chain) -> Vec<u64> {
    index.iter().map(|id| chain.get(id).capacity()).collect()
}

/// Append a reclaimable node flanked by live spacer nodes on both sides,
/// so `ReclaimableIndex::insert` has no spatial neighbor to coalesce
/// with. Mirrors S1's "insert (uncoalesced)" setup.
fn push_isolated(chain: &mut Chain, index: &mut ReclaimableIndex, capacity: u64) -> NodeId {
    chain.append(1); // live spacer
    let id = chain.append(capacity);
    chain.get_mut(id).is_live = false;
    index.insert(id, chain);
    id
}

#[test]
fn test_sort_order() {
    let mut chain = Chain::new();
    let mut index = ReclaimableIndex::new();
    for capacity in [3, 1, 2, 2, 5, 10] {
        push_isolated(&mut chain, &mut index, capacity);
    }
    assert_eq!(capacities(&index, &chain), vec![1, 2, 2, 3, 5, 10]);
}

#[test]
fn test_best_fit_lookup_table() {
    let mut chain = Chain::new();
    let mut index = ReclaimableIndex::new();
    for capacity in [3, 1, 2, 2, 5, 10] {
        push_isolated(&mut chain, &mut index, capacity);
    }

    let expect = [
        (0, Some(0)),
        (1, Some(0)),
        (2, Some(1)),
        (3, Some(3)),
        (4, Some(4)),
        (5, Some(4)),
        (6, Some(5)),
        (7, Some(5)),
        (8, Some(5)),
        (9, Some(5)),
        (10, Some(5)),
        (11, None),
        (100, None),
    ];
    for (min_size, want) in expect {
        let got = index.find(min_size, &chain).map(|(pos, _)| pos);
        assert_eq!(got, want, "find({})", min_size);
    }
}

#[test]
fn test_remove_front_middle_end() {
    let mut chain = Chain::new();
    let mut index = ReclaimableIndex::new();
    let mut ids = Vec::new();
    for capacity in [3, 1, 2, 2, 5, 10] {
        ids.push(push_isolated(&mut chain, &mut index, capacity));
    }

    let cap1_id = ids[1]; // capacity 1
    index.remove(cap1_id, &chain).expect("remove capacity-1 entry");
    assert_eq!(capacities(&index, &chain), vec![2, 2, 3, 5, 10]);

    assert!(matches!(index.remove(cap1_id, &chain), Err(Error::NotInIndex(_))));

    let cap3_id = ids[0]; // capacity 3, now at position 2
    index.remove(cap3_id, &chain).expect("remove capacity-3 entry");
    assert_eq!(capacities(&index, &chain), vec![2, 2, 5, 10]);

    let cap10_id = ids[5];
    index.remove(cap10_id, &chain).expect("remove capacity-10 entry");
    assert_eq!(capacities(&index, &chain), vec![2, 2, 5]);
}

#[test]
fn test_tie_capacity_removes_correct_identity() {
    let mut chain = Chain::new();
    let mut index = ReclaimableIndex::new();
    let a = push_isolated(&mut chain, &mut index, 4);
    let b = push_isolated(&mut chain, &mut index, 4);

    index.remove(a, &chain).expect("remove first of the tie");
    assert_eq!(capacities(&index, &chain), vec![4]);
    assert_eq!(index.iter().next(), Some(b));
}

/// Builds a contiguous run of `capacities.len()` reclaimable nodes
/// tiling `[0, sum(capacities))`, each already present in the index
/// (as if loaded from a persisted document predating a coalescing
/// pass), and returns their ids in chain order.
fn tiled_reclaimable(chain: &mut Chain, index: &mut ReclaimableIndex, capacities: &[u64]) -> Vec<NodeId> {
    let mut ids = Vec::new();
    for &capacity in capacities {
        let id = chain.append(capacity);
        chain.get_mut(id).is_live = false;
        index.raw_push(id);
        ids.push(id);
    }
    // raw_push doesn't sort; re-sort the same way a freshly loaded
    // document's reclaimable list is expected to already be in.
    for id in &ids {
        index.remove(*id, chain).unwrap();
    }
    for id in &ids {
        index.sorted_insert(*id, chain);
    }
    ids
}

#[test]
fn test_middle_coalescing() {
    let mut chain = Chain::new();
    let mut index = ReclaimableIndex::new();
    let caps = [3u64, 1, 2, 2, 5, 10];
    let ids = tiled_reclaimable(&mut chain, &mut index, &caps);
    let total: u64 = caps.iter().sum();

    // Insert a zero-width reclaimable node between chain positions 1
    // and 2 (node-1 ends at 4, node-2 starts at 4).
    let boundary = chain.get(ids[1]).end;
    assert_eq!(boundary, chain.get(ids[2]).start);

    let new_id = chain.insert_built(NodeData {
        start: boundary,
        end: boundary,
        value_size: 0,
        is_live: false,
        prev: Some(ids[1]),
        next: Some(ids[2]),
    });
    chain.get_mut(ids[1]).next = Some(new_id);
    chain.get_mut(ids[2]).prev = Some(new_id);

    index.insert(new_id, &mut chain);

    assert_eq!(index.len(), 1);
    let (_, fused) = index.find(0, &chain).expect("one fused entry");
    assert_eq!(chain.get(fused).start, 0);
    assert_eq!(chain.get(fused).end, total);
    assert_eq!(chain.get(fused).capacity(), total);
}

#[test]
fn test_end_coalescing() {
    let mut chain = Chain::new();
    let mut index = ReclaimableIndex::new();
    let caps = [3u64, 1, 2, 2, 5, 10];
    tiled_reclaimable(&mut chain, &mut index, &caps);
    let total: u64 = caps.iter().sum();

    let new_id = chain.append(21);
    chain.get_mut(new_id).is_live = false;
    index.insert(new_id, &mut chain);

    assert_eq!(index.len(), 1);
    let (_, fused) = index.find(0, &chain).expect("one fused entry");
    assert_eq!(chain.get(fused).start, 0);
    assert_eq!(chain.get(fused).end, total + 21);
    assert_eq!(chain.get(fused).capacity(), total + 21);
    assert_eq!(chain.tail(), Some(fused));
}

#[test]
fn test_insert_without_neighbors_does_not_coalesce() {
    let mut chain = Chain::new();
    let mut index = ReclaimableIndex::new();
    let id = push_isolated(&mut chain, &mut index, 6);
    assert_eq!(index.len(), 1);
    assert_eq!(capacities(&index, &chain), vec![6]);
    assert_eq!(index.iter().next(), Some(id));
}
