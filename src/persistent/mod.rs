//! Persistent (copy-on-write) sparse maps.
//!
//! The schedule state keeps every occupancy relation and per-day cache in
//! a [`PersistentMap`], so snapshotting the whole state for best-so-far
//! bookkeeping is a handful of reference-count bumps instead of a deep
//! copy.
//!
//! # Submodules
//!
//! - [`key`]: two- and three-part integer keys
//! - [`treap`]: the path-copying treap itself

pub mod key;
pub mod treap;

pub use key::{Key2, Key3, MapKey};
pub use treap::{Iter, PersistentMap};
