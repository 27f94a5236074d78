use super::*;
use std::sync::Arc;
use std::thread;

#[test]
fn test_lock_unlock_roundtrip() {
    let slot: Slot<i64, i64> = Slot::new(SlotState::Data(1, 10));
    assert_eq!(slot.peek_kind(), KIND_DATA);
    {
        let guard = slot.lock();
        assert_eq!(guard.kind(), KIND_DATA);
    }
    assert_eq!(slot.peek_kind(), KIND_DATA);
}

#[test]
fn test_replace_changes_kind() {
    let slot: Slot<i64, i64> = Slot::empty();
    {
        let mut guard = slot.lock();
        guard.replace(SlotState::Data(5, 50));
    }
    assert_eq!(slot.peek_kind(), KIND_DATA);
}

#[test]
fn test_hand_off_then_finish_rebuild() {
    let slot: Slot<i64, i64> = Slot::new(SlotState::Data(1, 10));
    {
        let guard = slot.lock();
        guard.hand_off_for_rebuild();
    }
    // The slot is still locked: a concurrent locker must block until the
    // background task finishes the rebuild.
    let slot = Arc::new(slot);
    let locked_slot = Arc::clone(&slot);
    let handle = thread::spawn(move || {
        let guard = locked_slot.lock();
        guard.kind()
    });

    std::thread::sleep(std::time::Duration::from_millis(20));
    slot.finish_rebuild(SlotState::Data(2, 20));

    assert_eq!(handle.join().unwrap(), KIND_DATA);
}

#[test]
fn test_concurrent_lockers_serialize() {
    let slot = Arc::new(Slot::<i64, i64>::new(SlotState::Data(0, 0)));
    let mut handles = vec![];
    for _ in 0..8 {
        let slot = Arc::clone(&slot);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let mut guard = slot.lock();
                let next = match guard.get() {
                    SlotState::Data(k, v) => (*k, v + 1),
                    _ => unreachable!(),
                };
                guard.replace(SlotState::Data(next.0, next.1));
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    let guard = slot.lock();
    match guard.get() {
        SlotState::Data(_, v) => assert_eq!(*v, 8 * 500),
        _ => unreachable!(),
    }
}
