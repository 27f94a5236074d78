//! Module `key` defines the bound this crate requires of index keys.
//!
//! A linear model needs keys to behave like points on a number line: total
//! order, and a subtractive key-space metric for fitting and evaluating
//! the regression. `IndexKey` captures exactly that, and is implemented
//! for the built-in integer and floating-point types.
//!
//! `as_f64` alone is not enough for that metric: two distinct `i64`/`u64`
//! keys beyond roughly `2^53` can cast to the identical `f64`, collapsing
//! a perfectly valid sorted, distinct keyset into a degenerate one. Every
//! place this crate differences two keys goes through `sub_as_f64`
//! instead, which computes the difference in the key's own (exact,
//! 128-bit) integer domain before ever touching a float.

/// Numeric key bound for [`crate::index::Index`].
///
/// `as_f64` must be monotone non-decreasing over the key's native
/// ordering, used only where an absolute (not relative) floating-point
/// value is unavoidable, e.g. log messages. `sub_as_f64` is the metric
/// actually used for model fitting and evaluation: `self - other`
/// computed exactly in the key's native arithmetic, then converted once
/// to `f64`.
pub trait IndexKey: Copy + Clone + PartialOrd + PartialEq + Send + Sync + 'static {
    fn as_f64(&self) -> f64;

    fn sub_as_f64(&self, other: &Self) -> f64;
}

macro_rules! impl_index_key_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl IndexKey for $t {
                fn as_f64(&self) -> f64 {
                    *self as f64
                }

                fn sub_as_f64(&self, other: &Self) -> f64 {
                    // i128 covers the full range of every integer type
                    // listed here, so the subtraction below is exact.
                    (*self as i128 - *other as i128) as f64
                }
            }
        )*
    };
}

impl_index_key_int![i8, i16, i32, i64, isize, u8, u16, u32, u64, usize];

impl IndexKey for f32 {
    fn as_f64(&self) -> f64 {
        *self as f64
    }

    fn sub_as_f64(&self, other: &Self) -> f64 {
        (*self as f64) - (*other as f64)
    }
}

impl IndexKey for f64 {
    fn as_f64(&self) -> f64 {
        *self
    }

    fn sub_as_f64(&self, other: &Self) -> f64 {
        self - other
    }
}

#[cfg(test)]
#[path = "key_test.rs"]
mod key_test;
