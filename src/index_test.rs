use super::*;
use crate::transform::IdentityTransform;

#[test]
fn test_scenario_small_sequential() {
    let index: Index<i64, i64> = Index::new(0, None);
    index.bulk_load(&[(1, 10), (2, 20), (3, 30)]);

    assert_eq!(index.find(2), Some(20));
    index.insert(4, 40);
    assert_eq!(index.find(4), Some(40));
    assert!(index.remove(2));
    assert_eq!(index.find(2), None);
}

#[test]
fn test_scenario_bucket_fill_and_rebuild() {
    let hyper = HyperParams {
        max_bucket_size: 4,
        ..HyperParams::default()
    };
    let index: Index<i64, i64> = Index::new(0, None).with_hyper_params(hyper);
    // Seed a root with a far-apart pair so later inserts collide on one
    // slot instead of landing in their own.
    index.bulk_load(&[(0, 0), (1_000_000, 1)]);

    for k in [100_i64, 101, 102, 103, 104] {
        index.insert(k, k * 10);
    }

    for k in [100_i64, 101, 102, 103, 104] {
        assert_eq!(index.find(k), Some(k * 10));
    }
}

#[test]
fn test_scenario_aggregation_fan_in() {
    let index: Index<i64, i64> = Index::new(0, None);
    let kvs: Vec<(i64, i64)> = (0..1000).map(|i| (i, i * 2)).collect();
    index.bulk_load(&kvs);

    for (k, v) in &kvs {
        assert_eq!(index.find(*k), Some(*v));
    }
    let stats = index.stats();
    assert_eq!(stats.num_entries, kvs.len());
}

#[test]
fn test_scenario_degenerate_fit_fallback() {
    let index: Index<i64, i64> = Index::new(0, None);
    let base: i64 = 1_000_000_000_000_000_000;
    let kvs: Vec<(i64, i64)> = (0..64).map(|i| (base + i, i)).collect();
    index.bulk_load(&kvs);

    for (k, v) in &kvs {
        assert_eq!(index.find(*k), Some(*v));
    }
}

#[test]
fn test_update_on_absent_key_is_noop() {
    let index: Index<i64, i64> = Index::new(0, None);
    index.bulk_load(&[(1, 10)]);
    assert!(!index.update(99, 999));
    assert_eq!(index.find(99), None);
}

#[test]
fn test_bulk_load_twice_panics() {
    let index: Index<i64, i64> = Index::new(0, None);
    index.bulk_load(&[(1, 10)]);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        index.bulk_load(&[(2, 20)]);
    }));
    assert!(result.is_err());
}

#[test]
fn test_insert_without_prior_bulk_load() {
    let index: Index<i64, i64> = Index::new(0, None);
    index.insert(5, 50);
    assert_eq!(index.find(5), Some(50));
}

#[test]
fn test_scan_is_always_empty() {
    let index: Index<i64, i64> = Index::new(0, None);
    index.bulk_load(&[(1, 10), (2, 20)]);
    assert!(index.scan(1, 2).is_empty());
}

#[test]
fn test_bulk_load_adaptive_picks_bucket_size_and_is_queryable() {
    let index: Index<i64, i64> = Index::new(0, None);
    let kvs: Vec<(i64, i64)> = (0..2000).map(|i| (i, i + 1)).collect();
    index.bulk_load_adaptive(&kvs, &IdentityTransform);
    for (k, v) in &kvs {
        assert_eq!(index.find(*k), Some(*v));
    }
}

#[test]
fn test_model_size_and_index_size_grow_with_tree() {
    let index: Index<i64, i64> = Index::new(0, None);
    let kvs: Vec<(i64, i64)> = (0..5000).map(|i| (i, i)).collect();
    index.bulk_load(&kvs);
    assert!(index.model_size() > 0);
    assert!(index.index_size() > 0);
}
