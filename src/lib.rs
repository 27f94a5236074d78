//! `adaptix` is a concurrent, adaptive, model-based (learned) ordered
//! index for a single-machine in-memory key-value store.
//!
//! The index is a tree of model nodes, each owning a fitted linear
//! function that projects a key into a slot-array position. Lookups
//! descend deterministically by evaluating the model at each node;
//! structural growth happens exclusively through **rebuild** -- when a
//! leaf bucket fills, its slot is handed off to a background worker
//! that builds a replacement subtree and swaps it in without blocking
//! concurrent foreground operations on other slots.
//!
//! See [`Index`] for the public entry point.

#[macro_use]
mod error;

mod bucket;
mod conflicts;
mod index;
mod key;
mod model;
mod node;
mod pool;
mod slot;
mod transform;
mod util;

pub use crate::error::{Error, Result};
pub use crate::index::{Index, Stats};
pub use crate::key::IndexKey;
pub use crate::node::HyperParams;
pub use crate::pool::{BackgroundPool, InlinePool, Job, ThreadPool};
pub use crate::transform::{FlowTransform, IdentityTransform};
