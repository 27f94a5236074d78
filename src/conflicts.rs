//! Module `conflicts` implements the conflict analysis that drives a model
//! node's layout: given sorted keys and a size-amplification factor, fit a
//! linear model and compute, for each clamped predicted position, how many
//! input keys land there.
//!
//! Grounded on `examples/original_source/src/core/conflicts.h`
//! (`build_linear_model`/`compute_tail_conflicts`).

use crate::key::IndexKey;
use crate::model::{LinearModel, LinearModelBuilder};

/// Rounding offset baked into every fitted model's intercept so that
/// `predict(origin) == 0` exactly (see the `debug_assert_eq!` below).
const ORIGIN_INTERCEPT: f64 = 0.5;

/// One `(position, occupancy)` entry: `occupancy` input keys predict
/// `position` under the fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict {
    pub position: usize,
    pub occupancy: u32,
}

pub struct ConflictsInfo {
    pub conflicts: Vec<Conflict>,
    pub capacity: usize,
}

/// Fit a linear model on `(scaled_key_i, i)` and compute the conflict
/// layout for the node that will hold `keys`.
///
/// `keys` must be strictly sorted and must not be all-equal (caller bug --
/// panics, matching spec.md's "precondition violations" error kind).
pub fn build_linear_model<K: IndexKey>(keys: &[K], size_amp: f64) -> (LinearModel<K>, ConflictsInfo) {
    let n = keys.len();
    assert!(n > 0, "build_linear_model: empty key slice");

    let min_key = keys[0];
    let max_key = keys[n - 1];
    // key_space and every `scaled` value below are differenced with
    // sub_as_f64, which computes in the key's own (exact) arithmetic
    // before ever touching a float -- as_f64 alone collapses distinct
    // i64/u64 keys beyond ~2^53 onto the same double.
    let key_space = max_key.sub_as_f64(&min_key);
    assert!(
        key_space.abs() > f64::EPSILON,
        "build_linear_model: min and max key are equal ({}), caller must dedupe/split first",
        min_key.as_f64()
    );

    let capacity_hint = ((n as f64) * size_amp) as usize;

    let mut builder = LinearModelBuilder::new();
    for (i, k) in keys.iter().enumerate() {
        let scaled = k.sub_as_f64(&min_key) * (n as f64) / key_space;
        builder.add(scaled, i as f64);
    }
    let fit = builder.build();

    if fit.slope.abs() < f64::EPSILON {
        log::error!(
            "build_linear_model: degenerate fit (slope ~ 0) for key space [{}, {}], size {}",
            min_key.as_f64(),
            max_key.as_f64(),
            n
        );
        panic!(
            "build_linear_model: degenerate fit (slope ~ 0) for key space [{}, {}], size {}",
            min_key.as_f64(),
            max_key.as_f64(),
            n
        );
    }

    // `fit.slope` is the slope in the scaled-x domain; rescale it back to
    // act directly on `key.sub_as_f64(&min_key)`. The fitted intercept is
    // discarded in favor of ORIGIN_INTERCEPT: the scaled-x domain already
    // places `min_key` at x = 0, so the rescaled model is exact there by
    // construction and only needs the rounding offset.
    let mut model = LinearModel {
        slope: fit.slope * (n as f64) / key_space,
        intercept: ORIGIN_INTERCEPT,
        origin: min_key,
    };
    debug_assert_eq!(model.predict(keys[0]), 0, "first prediction must be zero");

    let predicted_size = model.predict(keys[n - 1]) + 1;
    let mut capacity = if predicted_size > 1 {
        (predicted_size as usize).min(capacity_hint)
    } else {
        capacity_hint
    };
    capacity = capacity.max(1);

    let first_pos = model.predict_clamped(keys[0], capacity);
    let last_pos = model.predict_clamped(keys[n - 1], capacity);
    if first_pos == last_pos {
        // Model collapses first and last key onto the same slot: fall
        // back to a direct-index model scaling key - min_key by n / key_space.
        model.slope = (n as f64) / key_space;
        model.intercept = ORIGIN_INTERCEPT;
    }

    let mut conflicts = Vec::new();
    let mut p_last = model.predict_clamped(keys[0], capacity);
    let mut occupancy: u32 = 1;
    for k in keys.iter().skip(1) {
        let p = model.predict_clamped(*k, capacity);
        if p == p_last {
            occupancy += 1;
        } else {
            conflicts.push(Conflict {
                position: p_last,
                occupancy,
            });
            p_last = p;
            occupancy = 1;
        }
    }
    conflicts.push(Conflict {
        position: p_last,
        occupancy,
    });

    (model, ConflictsInfo { conflicts, capacity })
}

/// The occupancy at the `tail_percent`-th percentile of the conflict
/// distribution, minus one. Used to pick a bucket capacity `B` that bounds
/// tail cost while keeping average cost low.
pub fn tail_conflicts<K: IndexKey>(keys: &[K], size_amp: f64, tail_percent: f64) -> u32 {
    if keys.len() < 2 {
        return 0;
    }
    let (_, ci) = build_linear_model(keys, size_amp);
    if ci.conflicts.is_empty() {
        return 0;
    }
    let mut occupancies: Vec<u32> = ci.conflicts.iter().map(|c| c.occupancy).collect();
    occupancies.sort_unstable();
    let tail_idx = ((occupancies.len() as f64) * tail_percent) as i64 - 1;
    let tail_idx = tail_idx.max(0) as usize;
    occupancies[tail_idx.min(occupancies.len() - 1)].saturating_sub(1)
}

#[cfg(test)]
#[path = "conflicts_test.rs"]
mod conflicts_test;
