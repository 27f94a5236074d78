//! Module `index` implements the public façade: root ownership, request
//! entry points, and dispatch of rebuild tasks to a background pool.
//!
//! Grounded on `examples/original_source/src/core/nfl_para.h`'s
//! `NFLPara` (the outermost driver owning the tree and the thread pool)
//! and `afli_para.h`'s `AFLIPara` (root-level `find`/`update`/`remove`/
//! `insert`/`bulk_load` dispatch onto the root node).

use std::mem::size_of;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, RwLock};

use crate::conflicts::tail_conflicts;
use crate::key::IndexKey;
use crate::model::LinearModel;
use crate::node::{HyperParams, ModelNode};
use crate::pool::{BackgroundPool, InlinePool, Job, ThreadPool};
use crate::slot::{RebuildTicket, Slot, SlotState};
use crate::transform::{should_enable_flow, FlowTransform};

/// Memory-accounting and shape snapshot of a tree, gathered by walking
/// every reachable node once (fanned-in children counted once).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub num_nodes: usize,
    pub num_slots: usize,
    pub num_buckets: usize,
    pub num_entries: usize,
}

/// The concurrent, model-based ordered index.
pub struct Index<K, V> {
    root: RwLock<Option<Arc<ModelNode<K, V>>>>,
    hyper: HyperParams,
    pool: Box<dyn BackgroundPool>,
    node_ids: Arc<AtomicU64>,
    back_pressure_depth: usize,
}

impl<K, V> Index<K, V>
where
    K: IndexKey,
    V: Clone + Send + Sync + 'static,
{
    /// `num_background_workers == 0` with no externally supplied `pool`
    /// runs rebuilds inline on the submitting thread, per §6.
    pub fn new(num_background_workers: u32, pool: Option<Box<dyn BackgroundPool>>) -> Index<K, V> {
        let pool: Box<dyn BackgroundPool> = match pool {
            Some(pool) => pool,
            None if num_background_workers == 0 => Box::new(InlinePool),
            None => Box::new(ThreadPool::new(num_background_workers as usize)),
        };
        Index {
            root: RwLock::new(None),
            hyper: HyperParams::default(),
            pool,
            node_ids: Arc::new(AtomicU64::new(0)),
            back_pressure_depth: 64,
        }
    }

    pub fn with_hyper_params(mut self, hyper: HyperParams) -> Index<K, V> {
        self.hyper = hyper;
        self
    }

    pub fn with_back_pressure_depth(mut self, depth: usize) -> Index<K, V> {
        self.back_pressure_depth = depth;
        self
    }

    /// Build the index from a sorted, unique key-value slice. Panics if
    /// the index is already populated, or if `kvs` is empty, unsorted,
    /// or contains duplicate keys.
    pub fn bulk_load(&self, kvs: &[(K, V)]) {
        assert!(!kvs.is_empty(), "bulk_load: empty input");
        assert!(
            kvs.windows(2).all(|w| w[0].0 < w[1].0),
            "bulk_load: keys must be strictly sorted and unique"
        );
        let mut root = self.root.write().unwrap();
        assert!(root.is_none(), "bulk_load: index already populated");
        *root = Some(ModelNode::build(kvs, 0, &self.hyper, self.node_ids.as_ref()));
    }

    /// [EXPANDED] Build the index the same way as [`Index::bulk_load`],
    /// but first pick `max_bucket_size` from the empirical tail-conflict
    /// count of `kvs` and decide whether `transform` is worth enabling
    /// by comparing tail conflicts with and without it.
    pub fn bulk_load_adaptive<T: FlowTransform<K>>(&self, kvs: &[(K, V)], transform: &T) {
        assert!(!kvs.is_empty(), "bulk_load_adaptive: empty input");
        assert!(
            kvs.windows(2).all(|w| w[0].0 < w[1].0),
            "bulk_load_adaptive: keys must be strictly sorted and unique"
        );

        let keys: Vec<K> = kvs.iter().map(|(k, _)| *k).collect();
        let picked_bucket_size = tail_conflicts(&keys, self.hyper.size_amplification, self.hyper.tail_percent)
            .max(1) as usize;

        let mut hyper = self.hyper;
        hyper.max_bucket_size = picked_bucket_size.clamp(1, 255);

        if should_enable_flow(&keys, transform, &hyper) {
            log::info!(
                "bulk_load_adaptive: numerical-flow transform reduces tail conflicts, but this index \
                 does not yet build a transformed parallel tree -- falling back to the untransformed build"
            );
        }

        let mut root = self.root.write().unwrap();
        assert!(root.is_none(), "bulk_load_adaptive: index already populated");
        *root = Some(ModelNode::build(kvs, 0, &hyper, self.node_ids.as_ref()));
    }

    pub fn find(&self, key: K) -> Option<V> {
        self.root.read().unwrap().as_ref().and_then(|root| root.find(key))
    }

    pub fn update(&self, key: K, value: V) -> bool {
        match self.root.read().unwrap().as_ref() {
            Some(root) => root.update(key, value),
            None => false,
        }
    }

    pub fn remove(&self, key: K) -> bool {
        match self.root.read().unwrap().as_ref() {
            Some(root) => root.remove(key),
            None => false,
        }
    }

    /// Insert `(key, value)`. If the index has no root yet (no prior
    /// `bulk_load`), lazily creates a singleton one.
    pub fn insert(&self, key: K, value: V) {
        let root = {
            let mut guard = self.root.write().unwrap();
            if guard.is_none() {
                *guard = Some(ModelNode::build(
                    &[(key, value.clone())],
                    0,
                    &self.hyper,
                    self.node_ids.as_ref(),
                ));
                return;
            }
            Arc::clone(guard.as_ref().unwrap())
        };

        if let Some(ticket) = ModelNode::insert(&root, key, value, &self.hyper, 0) {
            let job = self.make_rebuild_job(ticket);
            if self.pool.queued_depth() >= self.back_pressure_depth {
                self.pool.submit_and_wait(job);
            } else {
                self.pool.submit(job);
            }
        }
    }

    fn make_rebuild_job(&self, ticket: RebuildTicket<K, V>) -> Job {
        let hyper = self.hyper;
        let node_ids = Arc::clone(&self.node_ids);
        Box::new(move || {
            let RebuildTicket {
                parent,
                idx,
                depth,
                mut items,
            } = ticket;
            items.sort_by(|a, b| a.0.partial_cmp(&b.0).expect("keys must be totally ordered"));
            let child = ModelNode::build(&items, depth + 1, &hyper, node_ids.as_ref());
            parent.finish_rebuild(idx, SlotState::Child(child));
        })
    }

    /// Not in core scope: always returns the empty sequence.
    pub fn scan(&self, _begin: K, _end: K) -> Vec<(K, V)> {
        Vec::new()
    }

    pub fn model_size(&self) -> u64 {
        (self.stats().num_nodes * size_of::<LinearModel<K>>()) as u64
    }

    pub fn index_size(&self) -> u64 {
        let stats = self.stats();
        let slot_bytes = stats.num_slots * size_of::<Slot<K, V>>();
        let entry_bytes = stats.num_entries * size_of::<(K, V)>();
        (slot_bytes + entry_bytes) as u64
    }

    /// [EXPANDED] Shape and sizing snapshot of the current tree.
    pub fn stats(&self) -> Stats {
        let mut stats = Stats::default();
        if let Some(root) = self.root.read().unwrap().as_ref() {
            root.collect_stats(&mut stats);
        }
        stats
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
