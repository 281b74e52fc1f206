//! chained-hashmap: a single-threaded, separate-chaining hash map with
//! power-of-two growth and fail-fast cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a classic chained hash table whose invariants are easy to check
//!   from the code: bucket addressing by mask, collision chains, full
//!   rehash on growth, and a structural version that detects interference
//!   with an in-progress traversal.
//! - Layers:
//!   - `node`: chain nodes stored in a generational arena (`slotmap`);
//!     links and bucket heads are arena keys, so unlinking and relinking
//!     never copy entries or alias pointers.
//!   - `ChainedHashMap<K, V, S>`: bucket array, load factor, threshold and
//!     version; `put`/`get`/`remove`/`clear`/resize.
//!   - `cursor`: one bucket walk, projected to keys, values or entries,
//!     exposed as a borrowing `Iter` and as a detached fail-fast `Cursor`.
//!   - `views`: `keys()`, `values()`, `entries()` views that report `len`
//!     and hand out iterators and cursors without copying.
//!
//! Constraints
//! - Single-threaded: no locking, no atomics, no thread-safety guarantees.
//! - Capacity is always a power of two; a key lives in bucket
//!   `hash & (capacity - 1)`.
//! - After any insert returns, `len <= floor(capacity * load_factor)`.
//! - `K: Hash` runs once per lookup or insert and never during resize:
//!   each node caches its full 64-bit hash.
//! - The version bumps on insert-of-new-key, remove and clear; overwriting
//!   the value of an existing key is not structural.
//!
//! Iteration order
//! - Iteration is in bucket order, then chain order. Chain order after a
//!   resize is an artifact of the relink walk and is not part of the API.
//!
//! Fail-fast traversal
//! - Borrowing iterators can never observe interference; the borrow
//!   checker forbids it.
//! - `Cursor` holds no borrow and is handed the table on every step. It
//!   compares the table's version against its snapshot and reports
//!   `Error::ConcurrentModification` on drift. Removing through the cursor
//!   resynchronizes the snapshot.
//!
//! Absent values
//! - `get`/`put`/`remove` return `Option`, so "key not present" and "key
//!   present with a `None`-like value" are distinct outcomes.
//!
//! ```
//! use chained_hashmap::ChainedHashMap;
//!
//! let mut m = ChainedHashMap::with_capacity_and_load_factor(2, 0.75)?;
//! assert_eq!(m.put("a", 1), None);
//! assert_eq!(m.put("a", 2), Some(1));
//! m.put("b", 3);
//! assert_eq!(m.capacity(), 4);
//! assert_eq!(m.get("a"), Some(&2));
//!
//! let mut c = m.keys().cursor();
//! while c.has_next() {
//!     if *c.advance(&m)? == "a" {
//!         c.remove(&mut m)?;
//!     }
//! }
//! assert_eq!(m.len(), 1);
//! # Ok::<(), chained_hashmap::Error>(())
//! ```

pub mod chained_hash_map;
mod chained_hash_map_proptest;
pub mod config;
pub mod cursor;
pub mod error;
mod node;
pub mod views;

// Public surface
pub use chained_hash_map::{ChainedHashMap, IterMut};
pub use config::TableConfig;
pub use cursor::{
    Cursor, EntryCursor, EntryProjection, Iter, KeyCursor, KeyProjection, Projection,
    ValueCursor, ValueProjection,
};
pub use error::{Error, Result};
pub use views::{Entries, Keys, Values, View};
