//! Shared bucket walk and the two front-ends built on it.
//!
//! `Walk` is the single traversal algorithm: it stages the next node in
//! bucket order and knows how to step past it. It holds no borrow of the
//! table, so it can back both
//! - `Iter`, a borrowing `Iterator` (the borrow rules out interference), and
//! - `Cursor`, a detached fail-fast cursor that receives the table on every
//!   step and checks the structural version before touching it.
//!
//! What gets yielded is chosen by a `Projection`: key, value, or the
//! `(key, value)` entry.

use crate::chained_hash_map::ChainedHashMap;
use crate::error::{Error, Result};
use crate::node::{Arena, Bucket, NodeKey};
use core::iter::FusedIterator;
use core::marker::PhantomData;

/// Selects what a walk yields for each node.
pub trait Projection<K, V> {
    type Item<'a>
    where
        K: 'a,
        V: 'a;

    fn project<'a>(key: &'a K, value: &'a V) -> Self::Item<'a>;
}

/// Yields `&K`.
#[derive(Debug, Clone, Copy)]
pub struct KeyProjection;

/// Yields `&V`.
#[derive(Debug, Clone, Copy)]
pub struct ValueProjection;

/// Yields `(&K, &V)`.
#[derive(Debug, Clone, Copy)]
pub struct EntryProjection;

impl<K, V> Projection<K, V> for KeyProjection {
    type Item<'a>
        = &'a K
    where
        K: 'a,
        V: 'a;

    #[inline]
    fn project<'a>(key: &'a K, _value: &'a V) -> &'a K {
        key
    }
}

impl<K, V> Projection<K, V> for ValueProjection {
    type Item<'a>
        = &'a V
    where
        K: 'a,
        V: 'a;

    #[inline]
    fn project<'a>(_key: &'a K, value: &'a V) -> &'a V {
        value
    }
}

impl<K, V> Projection<K, V> for EntryProjection {
    type Item<'a>
        = (&'a K, &'a V)
    where
        K: 'a,
        V: 'a;

    #[inline]
    fn project<'a>(key: &'a K, value: &'a V) -> (&'a K, &'a V) {
        (key, value)
    }
}

/// Position in a bucket-order traversal: the staged next node and the
/// bucket it was found in.
#[derive(Debug, Clone)]
pub(crate) struct Walk {
    bucket: usize,
    next: Option<NodeKey>,
}

impl Walk {
    /// Stages the head of the first non-empty bucket.
    pub(crate) fn start(buckets: &[Bucket]) -> Self {
        let mut w = Walk {
            bucket: 0,
            next: None,
        };
        w.seek(buckets, 0);
        w
    }

    fn seek(&mut self, buckets: &[Bucket], from: usize) {
        self.next = None;
        self.bucket = buckets.len();
        for (i, head) in buckets.iter().enumerate().skip(from) {
            if head.is_some() {
                self.bucket = i;
                self.next = *head;
                return;
            }
        }
    }

    #[inline]
    pub(crate) fn staged(&self) -> Option<NodeKey> {
        self.next
    }

    /// Hands out the staged node and stages its successor: the chain
    /// successor if any, otherwise the head of the next non-empty bucket.
    pub(crate) fn step<K, V>(&mut self, buckets: &[Bucket], nodes: &Arena<K, V>) -> Option<NodeKey> {
        let current = self.next?;
        match nodes.get(current).and_then(|n| n.next) {
            Some(succ) => self.next = Some(succ),
            None => self.seek(buckets, self.bucket + 1),
        }
        Some(current)
    }
}

/// Borrowing iterator over a table in bucket order.
pub struct Iter<'a, K, V, P> {
    buckets: &'a [Bucket],
    nodes: &'a Arena<K, V>,
    walk: Walk,
    remaining: usize,
    _projection: PhantomData<P>,
}

impl<'a, K, V, P> Iter<'a, K, V, P> {
    pub(crate) fn new(buckets: &'a [Bucket], nodes: &'a Arena<K, V>) -> Self {
        Self {
            buckets,
            nodes,
            walk: Walk::start(buckets),
            remaining: nodes.len(),
            _projection: PhantomData,
        }
    }
}

impl<'a, K, V, P> Clone for Iter<'a, K, V, P> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets,
            nodes: self.nodes,
            walk: self.walk.clone(),
            remaining: self.remaining,
            _projection: PhantomData,
        }
    }
}

impl<'a, K: 'a, V: 'a, P: Projection<K, V>> Iterator for Iter<'a, K, V, P> {
    type Item = P::Item<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.walk.step(self.buckets, self.nodes)?;
        let node = self.nodes.get(k)?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(P::project(&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a, P: Projection<K, V>> ExactSizeIterator for Iter<'a, K, V, P> {}
impl<'a, K: 'a, V: 'a, P: Projection<K, V>> FusedIterator for Iter<'a, K, V, P> {}

/// Detached fail-fast cursor.
///
/// A cursor snapshots the table's structural version when it is created
/// and holds no borrow, so the table may be mutated between steps. Any
/// structural change made other than through [`Cursor::remove`] makes the
/// next `advance` or `remove` fail with [`Error::ConcurrentModification`].
/// So does passing a table other than the one the cursor was made from.
///
/// ```
/// use chained_hashmap::{ChainedHashMap, Error};
///
/// let mut m = ChainedHashMap::new();
/// m.put("a", 1);
/// let mut c = m.keys().cursor();
/// assert!(c.has_next());
/// m.put("b", 2);
/// assert!(matches!(c.advance(&m), Err(Error::ConcurrentModification { .. })));
/// ```
pub struct Cursor<K, V, P> {
    walk: Walk,
    current: Option<NodeKey>,
    expected_version: u64,
    table_id: u64,
    _pd: PhantomData<fn() -> (K, V, P)>,
}

impl<K, V, P> Clone for Cursor<K, V, P> {
    fn clone(&self) -> Self {
        Self {
            walk: self.walk.clone(),
            current: self.current,
            expected_version: self.expected_version,
            table_id: self.table_id,
            _pd: PhantomData,
        }
    }
}

impl<K, V, P> core::fmt::Debug for Cursor<K, V, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("walk", &self.walk)
            .field("current", &self.current)
            .field("expected_version", &self.expected_version)
            .field("table_id", &self.table_id)
            .finish()
    }
}

impl<K, V, P: Projection<K, V>> Cursor<K, V, P> {
    pub(crate) fn new<S>(table: &ChainedHashMap<K, V, S>) -> Self {
        Self {
            walk: Walk::start(&table.buckets),
            current: None,
            expected_version: table.version,
            table_id: table.id,
            _pd: PhantomData,
        }
    }

    /// True iff a node is staged. Does not consult the table.
    pub fn has_next(&self) -> bool {
        self.walk.staged().is_some()
    }

    fn check_version<S>(&self, table: &ChainedHashMap<K, V, S>) -> Result<()> {
        if table.id != self.table_id {
            tracing::trace!(
                cursor_table = self.table_id,
                table = table.id,
                "cursor used with a foreign table"
            );
            return Err(Error::ConcurrentModification {
                expected: self.expected_version,
                found: table.version,
            });
        }
        if table.version != self.expected_version {
            tracing::trace!(
                expected = self.expected_version,
                found = table.version,
                "cursor detected structural modification"
            );
            return Err(Error::ConcurrentModification {
                expected: self.expected_version,
                found: table.version,
            });
        }
        Ok(())
    }

    /// Moves to the staged node and returns its projection.
    pub fn advance<'a, S>(&mut self, table: &'a ChainedHashMap<K, V, S>) -> Result<P::Item<'a>> {
        self.check_version(table)?;
        let staged = self.walk.staged().ok_or(Error::NoSuchElement)?;
        let stale = || Error::ConcurrentModification {
            expected: self.expected_version,
            found: table.version,
        };
        // Same table, same version: the staged node is live.
        let node = table.nodes.get(staged).ok_or_else(stale)?;
        self.walk.step(&table.buckets, &table.nodes);
        self.current = Some(staged);
        Ok(P::project(&node.key, &node.value))
    }

    /// Removes the entry returned by the last `advance` from `table` and
    /// hands it back. The cursor resynchronizes with the table's new version,
    /// so its own removal does not fail the next step.
    pub fn remove<S>(&mut self, table: &mut ChainedHashMap<K, V, S>) -> Result<(K, V)> {
        let current = self.current.ok_or(Error::IllegalState)?;
        self.check_version(table)?;
        let removed = table
            .remove_node(current)
            .ok_or(Error::ConcurrentModification {
                expected: self.expected_version,
                found: table.version,
            })?;
        self.current = None;
        self.expected_version = table.version;
        Ok(removed)
    }
}

pub type KeyCursor<K, V> = Cursor<K, V, KeyProjection>;
pub type ValueCursor<K, V> = Cursor<K, V, ValueProjection>;
pub type EntryCursor<K, V> = Cursor<K, V, EntryProjection>;
