use super::*;

#[test]
fn test_distinct_positions_no_conflicts() {
    let keys: Vec<i64> = (0..100).collect();
    let (_, ci) = build_linear_model(&keys, 2.0);
    assert!(ci.capacity >= keys.len());
    let total: u32 = ci.conflicts.iter().map(|c| c.occupancy).sum();
    assert_eq!(total as usize, keys.len());
}

#[test]
fn test_conflicts_sum_to_input_size() {
    let mut keys: Vec<i64> = Vec::new();
    for i in 0..50 {
        keys.push(i * 3);
        keys.push(i * 3); // duplicate predicted bucket via dense clustering
    }
    keys.sort_unstable();
    let (_, ci) = build_linear_model(&keys, 1.0);
    let total: u32 = ci.conflicts.iter().map(|c| c.occupancy).sum();
    assert_eq!(total as usize, keys.len());
}

#[test]
fn test_tail_conflicts_on_uniform_keys() {
    let keys: Vec<i64> = (0..1000).collect();
    let t = tail_conflicts(&keys, 1.0, 0.99);
    // uniform, well-amplified keys should produce a small tail.
    assert!(t <= 3, "unexpectedly large tail conflict: {}", t);
}

#[test]
#[should_panic]
fn test_all_equal_keys_panics() {
    let keys = vec![5_i64; 10];
    build_linear_model(&keys, 1.0);
}
