use super::*;

#[test]
fn test_end_to_end_key_lifecycle() {
    let mut controller = MetadataController::new();

    assert_eq!(controller.set("a", 3), (0, 3));
    assert_eq!(controller.file_size(), 3);

    assert_eq!(controller.set("b", 5), (3, 8));
    assert_eq!(controller.file_size(), 8);

    // in-place: smaller value reuses node-a's existing capacity.
    assert_eq!(controller.set("a", 2), (0, 2));
    assert_eq!(controller.file_size(), 8);
    let a_id = *controller.keys().get("a").unwrap();
    assert_eq!(controller.chain().get(a_id).capacity(), 3);

    // relocate: node-a can't hold 10 bytes, so it's freed and a fresh
    // node is appended at the end of the file.
    assert_eq!(controller.set("a", 10), (8, 18));
    assert_eq!(controller.file_size(), 18);

    // node-a's old slot (capacity 3) and node-b's slot (capacity 5) are
    // spatially adjacent ([0,3) and [3,8)) and both reclaimable once
    // "b" is removed, so they coalesce into one capacity-8 entry.
    controller.remove("b").expect("remove b");
    assert_eq!(controller.index().len(), 1);

    // best-fit picks the coalesced capacity-8 entry in place, no growth.
    assert_eq!(controller.set("c", 7), (0, 7));
    assert_eq!(controller.file_size(), 18);
    assert_eq!(controller.index().len(), 0);
}

#[test]
fn test_remove_unknown_key() {
    let mut controller = MetadataController::new();
    match controller.remove("missing") {
        Err(Error::UnknownKey(_)) => (),
        other => panic!("expected UnknownKey, got {:?}", other),
    }
}

#[test]
fn test_get_returns_none_for_unknown_key() {
    let controller = MetadataController::new();
    assert_eq!(controller.get("nope"), None);
}
