use super::*;
use crate::index::Stats;
use std::sync::atomic::AtomicU64;

fn build(kvs: &[(i64, i64)], hyper: &HyperParams) -> Arc<ModelNode<i64, i64>> {
    let ids = AtomicU64::new(0);
    ModelNode::build(kvs, 0, hyper, &ids)
}

#[test]
fn test_small_sequential() {
    let hyper = HyperParams::default();
    let kvs = vec![(1, 10), (2, 20), (3, 30)];
    let root = build(&kvs, &hyper);

    assert_eq!(root.find(2), Some(20));
    assert_eq!(root.find(99), None);

    assert!(root.update(2, 200));
    assert_eq!(root.find(2), Some(200));
    assert!(!root.update(99, 0));

    assert!(root.remove(2));
    assert_eq!(root.find(2), None);
    assert!(!root.remove(2));
}

#[test]
fn test_insert_into_bulk_loaded_tree() {
    let hyper = HyperParams::default();
    let kvs: Vec<(i64, i64)> = (0..200).map(|i| (i * 2, i * 2 * 10)).collect();
    let root = build(&kvs, &hyper);

    let ids = AtomicU64::new(1_000_000);
    let _ = &ids; // node ids for insert-triggered rebuilds come from the ticket's own builder.
    let ticket = ModelNode::insert(&root, 1, 111, &hyper, 0);
    assert_eq!(root.find(1), Some(111));
    // odd keys are sparse among even ones, unlikely to saturate a bucket,
    // but if they do, the ticket must carry the new key.
    if let Some(ticket) = ticket {
        assert!(ticket.items.iter().any(|(k, _)| *k == 1));
    }
}

#[test]
fn test_bucket_fill_triggers_rebuild_ticket() {
    let mut hyper = HyperParams::default();
    hyper.max_bucket_size = 4;
    // Construct a tiny tree with one data slot, then saturate it via
    // repeated inserts that all collide on the same predicted position.
    let kvs = vec![(0_i64, 0_i64), (1_000_000, 1)];
    let root = build(&kvs, &hyper);

    let mut last_ticket = None;
    for i in 1..5 {
        last_ticket = ModelNode::insert(&root, i, i * 10, &hyper, 0);
    }
    assert!(last_ticket.is_some(), "expected a rebuild ticket once the bucket saturated");
    let ticket = last_ticket.unwrap();
    assert_eq!(ticket.items.len(), hyper.max_bucket_size);
}

#[test]
fn test_rebuild_handoff_installs_child() {
    let mut hyper = HyperParams::default();
    hyper.max_bucket_size = 4;
    let kvs = vec![(0_i64, 0_i64), (1_000_000, 1)];
    let root = build(&kvs, &hyper);

    let mut ticket = None;
    for i in 1..5 {
        ticket = ModelNode::insert(&root, i, i * 10, &hyper, 0);
    }
    let ticket = ticket.expect("bucket should have saturated");

    let mut sorted = ticket.items.clone();
    sorted.sort_by_key(|(k, _)| *k);
    let ids = AtomicU64::new(500);
    let child = ModelNode::build(&sorted, ticket.depth + 1, &hyper, &ids);
    ticket.parent.finish_rebuild(ticket.idx, SlotState::Child(child));

    for i in 1..5 {
        assert_eq!(root.find(i), Some(i * 10));
    }
}

#[test]
fn test_aggregation_fan_in_shares_one_child() {
    let hyper = HyperParams::default();
    // Three adjacent positions each with well more than max_bucket_size
    // keys, packed densely enough that the conflict analyzer assigns
    // them contiguous positions.
    let mut kvs: Vec<(i64, i64)> = Vec::new();
    for i in 0..900 {
        kvs.push((i, i * 10));
    }
    let root = build(&kvs, &hyper);

    let mut stats = Stats::default();
    root.collect_stats(&mut stats);
    assert_eq!(stats.num_entries, kvs.len());
}

#[test]
fn test_degenerate_fit_fallback_all_findable() {
    let hyper = HyperParams::default();
    let base: i64 = 1_000_000_000_000_000_000;
    let kvs: Vec<(i64, i64)> = (0..64).map(|i| (base + i, i)).collect();
    let root = build(&kvs, &hyper);
    for (k, v) in &kvs {
        assert_eq!(root.find(*k), Some(*v));
    }
}
