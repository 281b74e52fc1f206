//! Lazy key, value and entry views over a `ChainedHashMap`.

use crate::chained_hash_map::ChainedHashMap;
use crate::cursor::{Cursor, EntryProjection, Iter, KeyProjection, Projection, ValueProjection};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;

/// A non-copying view of a table, projected through `P`.
pub struct View<'a, K, V, S, P> {
    table: &'a ChainedHashMap<K, V, S>,
    _projection: PhantomData<P>,
}

pub type Keys<'a, K, V, S> = View<'a, K, V, S, KeyProjection>;
pub type Values<'a, K, V, S> = View<'a, K, V, S, ValueProjection>;
pub type Entries<'a, K, V, S> = View<'a, K, V, S, EntryProjection>;

impl<'a, K, V, S, P> Clone for View<'a, K, V, S, P> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'a, K, V, S, P> Copy for View<'a, K, V, S, P> {}

impl<'a, K, V, S, P: Projection<K, V>> View<'a, K, V, S, P> {
    pub(crate) fn new(table: &'a ChainedHashMap<K, V, S>) -> Self {
        Self {
            table,
            _projection: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> Iter<'a, K, V, P> {
        self.table.walk()
    }

    /// A fail-fast cursor positioned before the first entry. The cursor does
    /// not borrow the table.
    pub fn cursor(&self) -> Cursor<K, V, P> {
        Cursor::new(self.table)
    }
}

impl<'a, K, V, S> Keys<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains_key(q)
    }
}

impl<'a, K, V: PartialEq, S> Values<'a, K, V, S> {
    /// Linear scan.
    pub fn contains(&self, v: &V) -> bool {
        self.iter().any(|x| x == v)
    }
}

impl<'a, K, V, S> Entries<'a, K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.table.get(key).is_some_and(|v| v == value)
    }
}

impl<'a, K: 'a, V: 'a, S, P: Projection<K, V>> IntoIterator for View<'a, K, V, S, P> {
    type Item = P::Item<'a>;
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, 'v, K: 'a, V: 'a, S, P: Projection<K, V>> IntoIterator for &'v View<'a, K, V, S, P> {
    type Item = P::Item<'a>;
    type IntoIter = Iter<'a, K, V, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::ChainedHashMap;
    use std::collections::BTreeSet;

    fn ab() -> ChainedHashMap<String, i32> {
        let mut m = ChainedHashMap::new();
        m.put("a".to_string(), 1);
        m.put("b".to_string(), 2);
        m
    }

    #[test]
    fn keys_view() {
        let m = ab();
        let keys = m.keys();
        assert!(keys.contains("a"));
        assert!(keys.contains("b"));
        assert!(!keys.contains("c"));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn values_view() {
        let m = ab();
        let values = m.values();
        assert!(values.contains(&1));
        assert!(values.contains(&2));
        assert!(!values.contains(&3));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn entries_view() {
        let m = ab();
        let entries = m.entries();
        assert_eq!(entries.len(), 2);
        for (k, v) in entries {
            assert!(k == "a" || k == "b");
            assert!(*v == 1 || *v == 2);
        }
        assert!(entries.contains(&"a".to_string(), &1));
        assert!(!entries.contains(&"a".to_string(), &2));
    }

    /// Invariant: views are live; they reflect the table at iteration time
    /// rather than copying it at creation.
    #[test]
    fn views_do_not_copy() {
        let mut m = ab();
        m.put("c".to_string(), 3);
        let keys: BTreeSet<&str> = m.keys().iter().map(String::as_str).collect();
        assert_eq!(keys, BTreeSet::from(["a", "b", "c"]));
        m.remove("a");
        assert_eq!(m.keys().len(), 2);
        assert_eq!(m.values().iter().sum::<i32>(), 5);
    }
}
