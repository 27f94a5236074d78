//! Module `slot` implements the per-position entry of a model node's slot
//! array, together with its per-slot spinlock.
//!
//! Grounded on `examples/original_source/src/afli_para/afli_node_para.h`'s
//! `Entry<KT, VT>` union / `EntryType` tag and the `lock`/`unlock`/`locked`
//! trio guarding each slot with a byte-sized `cmpxchgb` spinlock. The
//! original packs the tag into two parallel bitmaps (`bitmap0`/`bitmap1`)
//! addressed through their own, separate `bitmap_lock`; here the tag lives
//! alongside the lock flag in the high bits of a single [`AtomicU8`],
//! which removes the need for that second lock layer while keeping the
//! one-byte-per-slot, no-false-sharing layout the design calls for.

use std::cell::UnsafeCell;
use std::mem;
use std::sync::atomic::{AtomicU8, Ordering};

pub const KIND_EMPTY: u8 = 0;
pub const KIND_DATA: u8 = 1;
pub const KIND_BUCKET: u8 = 2;
pub const KIND_CHILD: u8 = 3;

const KIND_MASK: u8 = 0x7F;
const LOCK_BIT: u8 = 0x80;

/// The value held at one position of a model node's slot array.
pub enum SlotState<K, V> {
    Empty,
    Data(K, V),
    Bucket(crate::bucket::Bucket<K, V>),
    Child(std::sync::Arc<crate::node::ModelNode<K, V>>),
}

impl<K, V> SlotState<K, V> {
    fn kind(&self) -> u8 {
        match self {
            SlotState::Empty => KIND_EMPTY,
            SlotState::Data(..) => KIND_DATA,
            SlotState::Bucket(..) => KIND_BUCKET,
            SlotState::Child(..) => KIND_CHILD,
        }
    }
}

/// One entry of a model node's slot array: a tag-and-lock byte plus the
/// payload it guards.
///
/// Every descent operation (`find`/`update`/`remove`/`insert`) acquires
/// this lock for the duration of its work on the slot, per the design's
/// "acquire slot lock" step that opens every node-level operation. The
/// lock is released when the returned [`SlotGuard`] drops -- except when
/// a saturated bucket triggers a rebuild, in which case the inserting
/// thread calls [`SlotGuard::hand_off_for_rebuild`] to suppress the
/// unlock and a background task later releases it by calling
/// [`Slot::finish_rebuild`].
pub struct Slot<K, V> {
    tag: AtomicU8,
    value: UnsafeCell<SlotState<K, V>>,
}

// SAFETY: every access to `value` happens while the slot's own lock bit
// is held (verified by `lock`/`SlotGuard`/`finish_rebuild`), so a `Slot`
// can be shared across threads as long as `K`/`V` can.
unsafe impl<K: Send, V: Send> Sync for Slot<K, V> {}

impl<K, V> Slot<K, V> {
    pub fn new(state: SlotState<K, V>) -> Slot<K, V> {
        let tag = AtomicU8::new(state.kind());
        Slot {
            tag,
            value: UnsafeCell::new(state),
        }
    }

    pub fn empty() -> Slot<K, V> {
        Slot::new(SlotState::Empty)
    }

    /// Snapshot of this slot's kind, independent of any lock -- used by
    /// callers that only need a hint (e.g. statistics) and are prepared
    /// to double-check under the lock before acting.
    pub fn peek_kind(&self) -> u8 {
        self.tag.load(Ordering::Acquire) & KIND_MASK
    }

    /// Acquire the per-slot spinlock, spinning until it is free.
    pub fn lock(&self) -> SlotGuard<'_, K, V> {
        loop {
            let old = self.tag.load(Ordering::Acquire);
            if old & LOCK_BIT == 0 {
                let new = old | LOCK_BIT;
                if self
                    .tag
                    .compare_exchange_weak(old, new, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    return SlotGuard { slot: self };
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Install the result of a background rebuild and release the lock
    /// that was left held by a prior [`SlotGuard::hand_off_for_rebuild`].
    pub fn finish_rebuild(&self, state: SlotState<K, V>) {
        let kind = state.kind();
        // SAFETY: the caller holds the (still-set) lock bit on behalf of
        // the thread that handed this slot off; no other thread can be
        // concurrently mutating `value`.
        unsafe {
            *self.value.get() = state;
        }
        self.tag.store(kind, Ordering::Release);
    }
}

/// RAII handle to a locked slot.
pub struct SlotGuard<'a, K, V> {
    slot: &'a Slot<K, V>,
}

impl<'a, K, V> SlotGuard<'a, K, V> {
    pub fn kind(&self) -> u8 {
        self.slot.tag.load(Ordering::Relaxed) & KIND_MASK
    }

    pub fn get(&self) -> &SlotState<K, V> {
        // SAFETY: we hold the lock.
        unsafe { &*self.slot.value.get() }
    }

    pub fn get_mut(&mut self) -> &mut SlotState<K, V> {
        // SAFETY: we hold the lock.
        unsafe { &mut *self.slot.value.get() }
    }

    /// Overwrite the payload while keeping the lock held (released when
    /// this guard eventually drops).
    pub fn replace(&mut self, state: SlotState<K, V>) -> SlotState<K, V> {
        let kind = state.kind();
        // SAFETY: we hold the lock.
        let old = unsafe { mem::replace(&mut *self.slot.value.get(), state) };
        self.slot.tag.store(kind | LOCK_BIT, Ordering::Release);
        old
    }

    /// Consume this guard without releasing the lock: the caller is
    /// handing the (still-locked) slot off to a background rebuild task,
    /// which must eventually call [`Slot::finish_rebuild`] on the same
    /// slot to release it.
    pub fn hand_off_for_rebuild(self) {
        mem::forget(self);
    }
}

impl<'a, K, V> Drop for SlotGuard<'a, K, V> {
    fn drop(&mut self) {
        let old = self.slot.tag.load(Ordering::Relaxed);
        self.slot.tag.store(old & !LOCK_BIT, Ordering::Release);
    }
}

/// Everything a background worker needs to turn a saturated bucket into
/// either a larger bucket or a model subtree, and to publish the result
/// back into the parent node's slot array.
///
/// Grounded on the `RebuildInfo<KT, VT>` struct returned by
/// `TNodePara::insert` in the same header.
pub struct RebuildTicket<K, V> {
    pub parent: std::sync::Arc<crate::node::ModelNode<K, V>>,
    pub idx: usize,
    pub depth: usize,
    pub items: Vec<(K, V)>,
}

#[cfg(test)]
#[path = "slot_test.rs"]
mod slot_test;
