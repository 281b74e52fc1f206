//! ChainedHashMap: bucket array, collision chains, growth and the
//! structural version counter.

use crate::config::{threshold_for, TableConfig, DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR};
use crate::cursor::{EntryProjection, Iter, KeyProjection, Projection, ValueProjection};
use crate::error::Result;
use crate::node::{bucket_index, Arena, Bucket, Chain, Node, NodeKey};
use crate::views::View;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicU64, Ordering};
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::SlotMap;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

/// A hash map using separate chaining over a power-of-two bucket array.
///
/// Nodes live in an arena and are linked per bucket by arena key. When
/// `len` would exceed `capacity * load_factor`, the bucket array doubles
/// and every node is relinked into its new bucket using the hash cached
/// at insertion; `K: Hash` is never called during a resize.
pub struct ChainedHashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    pub(crate) buckets: Vec<Bucket>,
    pub(crate) nodes: Arena<K, V>,
    load_factor: f64,
    threshold: usize,
    pub(crate) version: u64,
    /// Distinguishes tables whose versions happen to agree; cursors carry it.
    pub(crate) id: u64,
}

impl<K, V> ChainedHashMap<K, V> {
    /// Empty map with 16 buckets and load factor 0.75.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Empty map with at least `initial_capacity` buckets (clamped to
    /// `MAX_CAPACITY`) and load factor 0.75. Fails with `InvalidArgument`
    /// when `initial_capacity` is 0.
    pub fn with_capacity(initial_capacity: usize) -> Result<Self> {
        Self::with_config(TableConfig::new().with_capacity(initial_capacity))
    }

    /// Fails with `InvalidArgument` when `initial_capacity` is 0 or
    /// `load_factor` is not a positive number.
    ///
    /// ```
    /// use chained_hashmap::{ChainedHashMap, Error};
    ///
    /// let m = ChainedHashMap::<u8, u8>::with_capacity_and_load_factor(5, 0.5).unwrap();
    /// assert_eq!((m.capacity(), m.threshold()), (8, 4));
    /// assert!(matches!(
    ///     ChainedHashMap::<u8, u8>::with_capacity_and_load_factor(5, f64::NAN),
    ///     Err(Error::InvalidArgument(_))
    /// ));
    /// ```
    pub fn with_capacity_and_load_factor(initial_capacity: usize, load_factor: f64) -> Result<Self> {
        Self::with_config(
            TableConfig::new()
                .with_capacity(initial_capacity)
                .with_load_factor(load_factor),
        )
    }

    /// As [`TableConfig::validate`], with the default hasher.
    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    /// Empty map with default sizing that hashes keys with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR, hasher)
    }

    /// Fails with `InvalidArgument` when `config` does not validate.
    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        let capacity = config.validate()?;
        Ok(Self::from_parts(capacity, config.load_factor, hasher))
    }

    fn from_parts(capacity: usize, load_factor: f64, hasher: S) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            hasher,
            buckets: vec![None; capacity],
            nodes: SlotMap::with_key(),
            load_factor,
            threshold: threshold_for(capacity, load_factor),
            version: 0,
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of buckets; always a power of two.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }
    /// Largest `len` the current bucket array holds without growing.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Removes every entry. Capacity is kept; this counts as a structural
    /// mutation for outstanding cursors.
    pub fn clear(&mut self) {
        let dropped = self.nodes.len();
        self.buckets.fill(None);
        self.nodes.clear();
        self.bump_version();
        tracing::trace!(dropped, capacity = self.capacity(), "cleared table");
    }

    pub fn keys(&self) -> View<'_, K, V, S, KeyProjection> {
        View::new(self)
    }

    pub fn values(&self) -> View<'_, K, V, S, ValueProjection> {
        View::new(self)
    }

    pub fn entries(&self) -> View<'_, K, V, S, EntryProjection> {
        View::new(self)
    }

    /// Entries in bucket order.
    pub fn iter(&self) -> Iter<'_, K, V, EntryProjection> {
        self.walk()
    }

    /// Entries with mutable values, in unspecified order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.nodes.values_mut(),
        }
    }

    pub(crate) fn walk<P: Projection<K, V>>(&self) -> Iter<'_, K, V, P> {
        Iter::new(&self.buckets, &self.nodes)
    }

    #[inline]
    fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Unlinks the first node in `hash`'s bucket matching `hit` and hands
    /// back its key and value. The chain is consistent again before the
    /// node leaves the arena.
    fn unlink_where<F>(&mut self, hash: u64, mut hit: F) -> Option<(K, V)>
    where
        F: FnMut(NodeKey, &Node<K, V>) -> bool,
    {
        let idx = bucket_index(hash, self.capacity());
        let mut prev: Option<NodeKey> = None;
        let mut at = self.buckets[idx];
        while let Some(k) = at {
            let node = self.nodes.get(k)?;
            if hit(k, node) {
                let next = node.next;
                match prev {
                    None => self.buckets[idx] = next,
                    Some(p) => self.nodes.get_mut(p)?.next = next,
                }
                let node = self.nodes.remove(k)?;
                self.bump_version();
                return Some((node.key, node.value));
            }
            prev = Some(k);
            at = node.next;
        }
        None
    }

    /// Removes a node located by arena key, as cursors do.
    pub(crate) fn remove_node(&mut self, k: NodeKey) -> Option<(K, V)> {
        let hash = self.nodes.get(k)?.hash;
        self.unlink_where(hash, |kk, _| kk == k)
    }

    /// Doubles the bucket array until `len` fits under the threshold, then
    /// relinks every node once. Old buckets are drained in slot order and
    /// each node is pushed at the head of its new chain, so chain order is
    /// not preserved.
    ///
    /// Terminates because `threshold_for` is unbounded at `MAX_CAPACITY`.
    fn resize(&mut self) {
        let old_capacity = self.capacity();
        let mut new_capacity = old_capacity;
        while self.len() > threshold_for(new_capacity, self.load_factor) {
            new_capacity *= 2;
        }

        let mut buckets: Vec<Bucket> = vec![None; new_capacity];
        for head in core::mem::take(&mut self.buckets) {
            let mut at = head;
            while let Some(k) = at {
                let Some(node) = self.nodes.get_mut(k) else {
                    break;
                };
                at = node.next;
                let idx = bucket_index(node.hash, new_capacity);
                node.next = buckets[idx];
                buckets[idx] = Some(k);
            }
        }
        self.buckets = buckets;
        self.threshold = threshold_for(new_capacity, self.load_factor);
        tracing::debug!(
            old_capacity,
            new_capacity,
            len = self.len(),
            threshold = self.threshold,
            "resized bucket array"
        );
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    fn find<Q>(&self, q: &Q) -> Option<NodeKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let head = self.buckets[bucket_index(hash, self.capacity())];
        Chain::new(&self.nodes, head)
            .find(|(_, n)| n.hash == hash && n.key.borrow() == q)
            .map(|(k, _)| k)
    }

    /// Inserts or overwrites. Returns the previous value when `key` was
    /// already present; overwriting is not a structural mutation.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        let idx = bucket_index(hash, self.capacity());

        let mut tail: Option<NodeKey> = None;
        let mut at = self.buckets[idx];
        while let Some(k) = at {
            let node = self.nodes.get_mut(k)?;
            if node.hash == hash && node.key == key {
                return Some(core::mem::replace(&mut node.value, value));
            }
            tail = Some(k);
            at = node.next;
        }

        let fresh = self.nodes.insert(Node::new(key, value, hash));
        match tail.and_then(|t| self.nodes.get_mut(t)) {
            Some(last) => last.next = Some(fresh),
            None => self.buckets[idx] = Some(fresh),
        }
        if self.len() > self.threshold {
            self.resize();
        }
        self.bump_version();
        None
    }

    /// The value stored under `q`, or `None` when the key is absent.
    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.nodes.get(k).map(|n| &n.value)
    }

    /// Mutable access to the value under `q`. Not a structural mutation.
    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.nodes.get_mut(k).map(|n| &mut n.value)
    }

    /// The stored key and value for `q`, or `None` when absent.
    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.nodes.get(k).map(|n| (&n.key, &n.value))
    }

    /// Whether an entry for `q` exists, whatever its value.
    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Removes `q` and returns its value; `None` leaves the version alone.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Like [`remove`](Self::remove), handing back the stored key as well.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.unlink_where(hash, |_, n| n.hash == hash && n.key.borrow() == q)
    }
}

impl<K, V> Default for ChainedHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_hasher(S::default());
        m.extend(iter);
        m
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, EntryProjection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over entries with mutable values.
pub struct IterMut<'a, K, V> {
    it: slotmap::basic::ValuesMut<'a, NodeKey, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|n| (&n.key, &mut n.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}
