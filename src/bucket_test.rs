use super::*;

#[test]
fn test_find_update_remove() {
    let b: Bucket<i64, i64> = Bucket::new(vec![(1, 10), (2, 20), (3, 30)], 6);
    assert_eq!(b.find(2), Some(20));
    assert_eq!(b.find(9), None);

    assert!(b.update(2, 200));
    assert_eq!(b.find(2), Some(200));
    assert!(!b.update(9, 0));

    assert!(b.remove(2));
    assert_eq!(b.find(2), None);
    assert_eq!(b.len(), 2);
    assert!(!b.remove(2));
}

#[test]
fn test_insert_reports_saturation() {
    let b: Bucket<i64, i64> = Bucket::new(vec![], 3);
    assert!(!b.insert(1, 1));
    assert!(!b.insert(2, 2));
    assert!(b.insert(3, 3));
    assert_eq!(b.len(), 3);
}

#[test]
fn test_snapshot_is_independent_copy() {
    let b: Bucket<i64, i64> = Bucket::new(vec![(1, 1)], 4);
    let snap = b.snapshot();
    b.insert(2, 2);
    assert_eq!(snap.len(), 1);
    assert_eq!(b.len(), 2);
}
