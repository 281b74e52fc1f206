//! Collision-chain nodes stored in a generational arena.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key of a chain node. Links between nodes and bucket heads are
    /// expressed with these keys instead of pointers.
    pub(crate) struct NodeKey;
}

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) next: Option<NodeKey>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, hash: u64) -> Self {
        Self {
            key,
            value,
            hash,
            next: None,
        }
    }
}

pub(crate) type Arena<K, V> = SlotMap<NodeKey, Node<K, V>>;

/// Bucket slot: head of a chain, or empty.
pub(crate) type Bucket = Option<NodeKey>;

#[inline]
pub(crate) fn bucket_index(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity.is_power_of_two());
    (hash as usize) & (capacity - 1)
}

/// Stateless walk over a chain starting at `head`.
pub(crate) struct Chain<'a, K, V> {
    arena: &'a Arena<K, V>,
    at: Option<NodeKey>,
}

impl<'a, K, V> Chain<'a, K, V> {
    pub(crate) fn new(arena: &'a Arena<K, V>, head: Bucket) -> Self {
        Self { arena, at: head }
    }
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (NodeKey, &'a Node<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.at?;
        let node = self.arena.get(k)?;
        self.at = node.next;
        Some((k, node))
    }
}
