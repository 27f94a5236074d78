//! Module `transform` defines the interface to the upstream numerical-flow
//! collaborator: an external monotone key remapping whose own training
//! and linear-algebra kernels are out of this crate's scope.
//!
//! Grounded on `examples/original_source/src/core/nfl_para.h`'s
//! `NFLPara<KT, VT>`, specifically its `enable_flow` flag and the
//! `tran_index: AFLIPara<double, KVT>` field -- a second tree keyed by
//! the transformed `f64` value with the original `(K, V)` pair carried
//! as the value, so no inverse lookup is ever needed.

use crate::conflicts::tail_conflicts;
use crate::key::IndexKey;
use crate::node::HyperParams;

/// A monotone key remapping supplied by an external collaborator.
///
/// Implementations must be non-decreasing over the training support:
/// `k1 <= k2 => transform(k1) <= transform(k2)`. The core never needs to
/// invert the mapping -- the original key travels alongside its
/// transformed counterpart.
pub trait FlowTransform<K: IndexKey>: Send + Sync {
    fn transform(&self, key: K) -> f64;

    /// Map a sorted `(K, V)` slice into `(transformed_key, (K, V))`
    /// pairs, preserving order.
    fn transform_batch<V: Clone>(&self, kvs: &[(K, V)]) -> Vec<(f64, (K, V))> {
        kvs.iter()
            .map(|(k, v)| (self.transform(*k), (*k, v.clone())))
            .collect()
    }
}

/// A transform that leaves keys unchanged, used when flow is disabled or
/// in tests that don't exercise the collaborator interface.
pub struct IdentityTransform;

impl<K: IndexKey> FlowTransform<K> for IdentityTransform {
    fn transform(&self, key: K) -> f64 {
        key.as_f64()
    }
}

/// Decide, at bulk-load time, whether the transform is worth enabling by
/// comparing tail-conflict counts before and after remapping -- per
/// §6's "Enabling the transform is decided at bulk-load time by
/// comparing tail-conflict counts before and after."
pub fn should_enable_flow<K, T>(keys: &[K], transform: &T, hyper: &HyperParams) -> bool
where
    K: IndexKey,
    T: FlowTransform<K>,
{
    if keys.len() < 2 {
        return false;
    }
    let before = tail_conflicts(keys, hyper.size_amplification, hyper.tail_percent);

    let transformed: Vec<f64> = keys.iter().map(|k| transform.transform(*k)).collect();
    if transformed.windows(2).any(|w| w[0] > w[1]) {
        log::warn!("should_enable_flow: transform is not monotone non-decreasing, refusing to enable");
        return false;
    }
    if transformed.first() == transformed.last() {
        return false;
    }
    let after = tail_conflicts(&transformed, hyper.size_amplification, hyper.tail_percent);

    after < before
}

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;
