//! Module implement common utility functions and types shared across the
//! index implementation.

pub mod spinlock;
pub mod thread;

pub use spinlock::Spinlock;
pub use thread::Thread;
