//! Module `node` implements the model node: a learned linear function
//! paired with a slot array, the unit of both lookup descent and
//! recursive bulk build.
//!
//! Grounded on `examples/original_source/src/afli_para/afli_node_para.h`
//! and `afli_node_para_impl.h` (`TNodePara`, `HyperParameter`, `build`).
//! The source's two parallel bitmaps plus a separate bitmap-word lock
//! collapse here into [`crate::slot::Slot`]'s single tag-and-lock byte
//! per slot; the descent skeleton (predict, lock slot, dispatch on tag)
//! and the bulk-build conflict walk (singleton / bucket / aggregated
//! child) are carried over unchanged in spirit.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::bucket::Bucket;
use crate::conflicts::{build_linear_model, Conflict};
use crate::key::IndexKey;
use crate::model::LinearModel;
use crate::slot::{RebuildTicket, Slot, SlotState, KIND_BUCKET, KIND_CHILD, KIND_DATA, KIND_EMPTY};

/// Tuning knobs threaded through bulk build and online insert.
///
/// Grounded on `HyperParameter` in `afli_node_para.h`; `num_nodes` there
/// is a build-time id counter rather than a tuning knob, so it is
/// modeled here as a free-standing [`AtomicU64`] passed alongside
/// `HyperParams` instead of a field on it.
#[derive(Debug, Clone, Copy)]
pub struct HyperParams {
    pub max_bucket_size: usize,
    pub aggregate_size: usize,
    pub max_num_bg: usize,
    pub size_amplification: f64,
    pub tail_percent: f64,
}

impl Default for HyperParams {
    fn default() -> HyperParams {
        HyperParams {
            max_bucket_size: 6,
            aggregate_size: 0,
            max_num_bg: 2,
            size_amplification: 2.0,
            tail_percent: 0.99,
        }
    }
}

/// An internal (or leaf-hosting) node of the index tree.
pub struct ModelNode<K, V> {
    pub id: u64,
    model: LinearModel<K>,
    capacity: usize,
    slots: Vec<Slot<K, V>>,
}

impl<K, V> ModelNode<K, V>
where
    K: IndexKey,
    V: Clone + Send + Sync + 'static,
{
    fn predict_idx(&self, key: K) -> usize {
        self.model.predict_clamped(key, self.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn find(&self, key: K) -> Option<V> {
        let idx = self.predict_idx(key);
        let guard = self.slots[idx].lock();
        match guard.kind() {
            KIND_EMPTY => None,
            KIND_DATA => match guard.get() {
                SlotState::Data(k, v) if *k == key => Some(v.clone()),
                SlotState::Data(..) => None,
                _ => unreachable!(),
            },
            KIND_BUCKET => match guard.get() {
                SlotState::Bucket(bucket) => bucket.find(key),
                _ => unreachable!(),
            },
            KIND_CHILD => {
                let child = match guard.get() {
                    SlotState::Child(child) => Arc::clone(child),
                    _ => unreachable!(),
                };
                drop(guard);
                child.find(key)
            }
            _ => unreachable!(),
        }
    }

    pub fn update(&self, key: K, value: V) -> bool {
        let idx = self.predict_idx(key);
        let mut guard = self.slots[idx].lock();
        match guard.kind() {
            KIND_EMPTY => false,
            KIND_DATA => {
                let matches = matches!(guard.get(), SlotState::Data(k, _) if *k == key);
                if matches {
                    guard.replace(SlotState::Data(key, value));
                }
                matches
            }
            KIND_BUCKET => match guard.get() {
                SlotState::Bucket(bucket) => bucket.update(key, value),
                _ => unreachable!(),
            },
            KIND_CHILD => {
                let child = match guard.get() {
                    SlotState::Child(child) => Arc::clone(child),
                    _ => unreachable!(),
                };
                drop(guard);
                child.update(key, value)
            }
            _ => unreachable!(),
        }
    }

    pub fn remove(&self, key: K) -> bool {
        let idx = self.predict_idx(key);
        let mut guard = self.slots[idx].lock();
        match guard.kind() {
            KIND_EMPTY => false,
            KIND_DATA => {
                let matches = matches!(guard.get(), SlotState::Data(k, _) if *k == key);
                if matches {
                    guard.replace(SlotState::Empty);
                }
                matches
            }
            KIND_BUCKET => match guard.get() {
                SlotState::Bucket(bucket) => bucket.remove(key),
                _ => unreachable!(),
            },
            KIND_CHILD => {
                let child = match guard.get() {
                    SlotState::Child(child) => Arc::clone(child),
                    _ => unreachable!(),
                };
                drop(guard);
                child.remove(key)
            }
            _ => unreachable!(),
        }
    }

    /// Insert `(key, value)`, recursing into children as needed.
    ///
    /// Returns `Some(ticket)` when the insert saturated a bucket: the
    /// slot lock is left held (see [`crate::slot::SlotGuard::hand_off_for_rebuild`])
    /// and the caller must submit `ticket` to a background worker, which
    /// finishes by calling [`ModelNode::finish_rebuild`].
    pub fn insert(
        self_arc: &Arc<ModelNode<K, V>>,
        key: K,
        value: V,
        hyper: &HyperParams,
        depth: usize,
    ) -> Option<RebuildTicket<K, V>> {
        let idx = self_arc.predict_idx(key);
        let mut guard = self_arc.slots[idx].lock();
        match guard.kind() {
            KIND_EMPTY => {
                guard.replace(SlotState::Data(key, value));
                None
            }
            KIND_DATA => {
                let (existing_key, existing_value) = match guard.get() {
                    SlotState::Data(k, v) => (*k, v.clone()),
                    _ => unreachable!(),
                };
                if existing_key == key {
                    guard.replace(SlotState::Data(key, value));
                    return None;
                }
                let bucket = Bucket::new(vec![(existing_key, existing_value)], hyper.max_bucket_size);
                let need_rebuild = bucket.insert(key, value);
                guard.replace(SlotState::Bucket(bucket));
                Self::complete_bucket_insert(guard, self_arc, idx, depth, need_rebuild)
            }
            KIND_BUCKET => {
                let need_rebuild = match guard.get() {
                    SlotState::Bucket(bucket) => bucket.insert(key, value),
                    _ => unreachable!(),
                };
                Self::complete_bucket_insert(guard, self_arc, idx, depth, need_rebuild)
            }
            KIND_CHILD => {
                let child = match guard.get() {
                    SlotState::Child(child) => Arc::clone(child),
                    _ => unreachable!(),
                };
                drop(guard);
                Self::insert(&child, key, value, hyper, depth + 1)
            }
            _ => unreachable!(),
        }
    }

    fn complete_bucket_insert<'a>(
        guard: crate::slot::SlotGuard<'a, K, V>,
        self_arc: &Arc<ModelNode<K, V>>,
        idx: usize,
        depth: usize,
        need_rebuild: bool,
    ) -> Option<RebuildTicket<K, V>> {
        if !need_rebuild {
            return None;
        }
        let items = match guard.get() {
            SlotState::Bucket(bucket) => bucket.snapshot(),
            _ => unreachable!(),
        };
        guard.hand_off_for_rebuild();
        Some(RebuildTicket {
            parent: Arc::clone(self_arc),
            idx,
            depth,
            items,
        })
    }

    /// Install the replacement subtree built from `ticket.items` and
    /// release the slot lock held since the triggering insert.
    ///
    /// Grounded on the "atomic handoff under the still-held slot lock"
    /// step of the rebuild protocol.
    pub fn finish_rebuild(&self, idx: usize, state: SlotState<K, V>) {
        self.slots[idx].finish_rebuild(state);
    }

    /// Recursively build a node from a sorted, unique key-value slice.
    ///
    /// Grounded on `TNodePara::build` in the same header; `node_ids`
    /// plays the role of `hyper_para.num_nodes`.
    pub fn build(kvs: &[(K, V)], depth: usize, hyper: &HyperParams, node_ids: &AtomicU64) -> Arc<ModelNode<K, V>> {
        assert!(!kvs.is_empty(), "ModelNode::build: empty key-value slice");

        if kvs.len() == 1 {
            // A singleton never gets a fitted model -- one data slot,
            // same as the `occupancy == 1` branch below, just without a
            // surrounding node to fit a model over (build_linear_model
            // requires at least two distinct keys).
            let (k, v) = (kvs[0].0, kvs[0].1.clone());
            let model = LinearModel {
                slope: 0.0,
                intercept: 0.5,
                origin: k,
            };
            return Arc::new(ModelNode {
                id: node_ids.fetch_add(1, AtomicOrdering::Relaxed),
                model,
                capacity: 1,
                slots: vec![Slot::new(SlotState::Data(k, v))],
            });
        }

        let keys: Vec<K> = kvs.iter().map(|(k, _)| *k).collect();
        let (model, ci) = build_linear_model(&keys, hyper.size_amplification);

        let mut slots: Vec<Slot<K, V>> = Vec::with_capacity(ci.capacity);
        slots.resize_with(ci.capacity, Slot::empty);

        let conflicts: &[Conflict] = &ci.conflicts;
        let mut j = 0usize;
        let mut i = 0usize;
        while i < conflicts.len() {
            let Conflict { position: p, occupancy } = conflicts[i];
            let c = occupancy as usize;
            if c == 0 {
                i += 1;
                continue;
            } else if c == 1 {
                let (k, v) = (kvs[j].0, kvs[j].1.clone());
                slots[p] = Slot::new(SlotState::Data(k, v));
                j += c;
                i += 1;
            } else if c <= hyper.max_bucket_size {
                let items = kvs[j..j + c].to_vec();
                slots[p] = Slot::new(SlotState::Bucket(Bucket::new(items, hyper.max_bucket_size)));
                j += c;
                i += 1;
            } else {
                let mut k_idx = i + 1;
                let mut seg_size = c;
                let end = if hyper.aggregate_size == 0 {
                    conflicts.len()
                } else {
                    (i + 1 + hyper.aggregate_size).min(conflicts.len())
                };
                while k_idx < end
                    && conflicts[k_idx].position - conflicts[k_idx - 1].position == 1
                    && (conflicts[k_idx].occupancy as usize) > hyper.max_bucket_size + 1
                {
                    seg_size += conflicts[k_idx].occupancy as usize;
                    k_idx += 1;
                }

                if seg_size == kvs.len() {
                    // No aggregation benefit possible: split into one
                    // child per conflicted position instead.
                    for u in i..k_idx {
                        let pu = conflicts[u].position;
                        let cu = conflicts[u].occupancy as usize;
                        let child = ModelNode::build(&kvs[j..j + cu], depth + 1, hyper, node_ids);
                        slots[pu] = Slot::new(SlotState::Child(child));
                        j += cu;
                    }
                } else {
                    let child = ModelNode::build(&kvs[j..j + seg_size], depth + 1, hyper, node_ids);
                    for u in i..k_idx {
                        let pu = conflicts[u].position;
                        slots[pu] = Slot::new(SlotState::Child(Arc::clone(&child)));
                    }
                    j += seg_size;
                }
                i = k_idx;
            }
        }

        log::debug!(
            "ModelNode::build: depth {} capacity {} keys {}",
            depth,
            ci.capacity,
            kvs.len()
        );

        Arc::new(ModelNode {
            id: node_ids.fetch_add(1, AtomicOrdering::Relaxed),
            model,
            capacity: ci.capacity,
            slots,
        })
    }

    /// Total number of occupied slots (`data`, `bucket` or `child`), not
    /// counting into children -- used by [`crate::index::Stats`].
    pub fn live_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.peek_kind() != KIND_EMPTY)
            .count()
    }

    /// Recursively count nodes, buckets, and entries reachable from
    /// `self`, deduplicating fanned-in child pointers by identity.
    pub fn collect_stats(&self, acc: &mut crate::index::Stats) {
        acc.num_nodes += 1;
        acc.num_slots += self.capacity;
        let mut last_child_id: Option<u64> = None;
        for slot in &self.slots {
            match slot.peek_kind() {
                KIND_EMPTY => {}
                KIND_DATA => acc.num_entries += 1,
                KIND_BUCKET => {
                    let guard = slot.lock();
                    if let SlotState::Bucket(bucket) = guard.get() {
                        acc.num_buckets += 1;
                        acc.num_entries += bucket.len();
                    }
                }
                KIND_CHILD => {
                    let guard = slot.lock();
                    if let SlotState::Child(child) = guard.get() {
                        if last_child_id != Some(child.id) {
                            last_child_id = Some(child.id);
                            let child = Arc::clone(child);
                            drop(guard);
                            child.collect_stats(acc);
                            continue;
                        }
                    }
                }
                _ => unreachable!(),
            }
            last_child_id = None;
        }
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
