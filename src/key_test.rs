use super::*;

#[test]
fn test_as_f64_preserves_order() {
    let xs: Vec<i64> = vec![-10, -1, 0, 1, 10, 1000];
    for w in xs.windows(2) {
        assert!(w[0].as_f64() < w[1].as_f64());
    }
}

#[test]
fn test_float_keys() {
    assert_eq!(1.5_f64.as_f64(), 1.5);
    assert_eq!(1.5_f32.as_f64(), 1.5_f32 as f64);
}

#[test]
fn test_sub_as_f64_exact_for_huge_nearby_keys() {
    // Beyond 2^53, as_f64 alone collapses distinct i64s onto one double;
    // sub_as_f64 must still tell every one of them apart.
    let base: i64 = 1_000_000_000_000_000_000;
    let xs: Vec<i64> = (0..64).map(|i| base + i).collect();
    assert_eq!(xs[0].as_f64(), xs[63].as_f64(), "precondition: as_f64 collapses these");
    for w in xs.windows(2) {
        assert_eq!(w[1].sub_as_f64(&w[0]), 1.0);
    }
    assert_eq!(xs[63].sub_as_f64(&xs[0]), 63.0);
}

#[test]
fn test_sub_as_f64_matches_subtraction_for_small_keys() {
    assert_eq!(10_i64.sub_as_f64(&3_i64), 7.0);
    assert_eq!(3_i64.sub_as_f64(&10_i64), -7.0);
    assert_eq!(5_u64.sub_as_f64(&5_u64), 0.0);
}
