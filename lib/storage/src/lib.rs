#![doc(test(attr(deny(warnings))))]

//! An in-memory, four-index [`flake_common::Snapshot`] implementation.
//!
//! The on-disk storage engine is out of scope (spec.md Sec. 1); this crate
//! exists to give the rest of the workspace (and its tests) something to run
//! queries against.

pub mod memory;
pub mod test_util;

pub use memory::{MemorySnapshot, MemoryStore};
