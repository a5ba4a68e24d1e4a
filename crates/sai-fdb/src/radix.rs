//! Arena-backed patricia tree over fixed-width 64-bit keys.
//!
//! Branch nodes test a single key bit (0 = most significant) and carry the
//! prefix shared by every key below them; leaves hold the key and value.
//! Bit indices strictly increase from the root down, so an in-order walk
//! (child 0 before child 1) visits keys in ascending order.
//!
//! Nodes live in a `Vec` and are referenced by index. Released slots go on a
//! free list and are reused by later inserts.

use std::mem;

/// Keys that can be stored in a [`RadixTree`].
///
/// `bits` must be injective and order preserving: `a < b` iff
/// `a.bits() < b.bits()`.
pub trait RadixKey: Copy + Eq {
    fn bits(&self) -> u64;
}

/// Result of [`RadixTree::insert`].
#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome<'a, V> {
    /// The value was stored under a new key.
    Inserted,
    /// The key was already present; the stored value is returned untouched
    /// and the offered one is dropped.
    AlreadyExists(&'a V),
}

impl<V> InsertOutcome<'_, V> {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

type NodeId = usize;

#[derive(Debug)]
enum Node<K, V> {
    Branch {
        bit: u8,
        prefix: u64,
        children: [NodeId; 2],
    },
    Leaf {
        key: K,
        value: V,
    },
    Vacant,
}

#[inline]
fn bit_at(bits: u64, index: u8) -> usize {
    ((bits >> (63 - u32::from(index))) & 1) as usize
}

/// Mask selecting the `len` most significant bits.
#[inline]
fn prefix_mask(len: u8) -> u64 {
    if len == 0 {
        0
    } else {
        u64::MAX << (64 - u32::from(len))
    }
}

#[derive(Debug)]
pub struct RadixTree<K, V> {
    nodes: Vec<Node<K, V>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl<K: RadixKey, V> Default for RadixTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RadixKey, V> RadixTree<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Exact lookup.
    pub fn get(&self, key: &K) -> Option<&V> {
        let leaf = self.closest_leaf(key.bits())?;
        match &self.nodes[leaf] {
            Node::Leaf { key: k, value } if k == key => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let leaf = self.closest_leaf(key.bits())?;
        match &mut self.nodes[leaf] {
            Node::Leaf { key: k, value } if k == key => Some(value),
            _ => None,
        }
    }

    /// Inserts `value` under `key` unless the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> InsertOutcome<'_, V> {
        let bits = key.bits();
        let Some(root) = self.root else {
            let leaf = self.alloc(Node::Leaf { key, value });
            self.root = Some(leaf);
            self.len += 1;
            return InsertOutcome::Inserted;
        };

        let closest = self.closest_leaf(bits).unwrap_or(root);
        let existing_bits = match &self.nodes[closest] {
            Node::Leaf { key: k, .. } => k.bits(),
            _ => bits,
        };
        if existing_bits == bits {
            return match &self.nodes[closest] {
                Node::Leaf { value, .. } => InsertOutcome::AlreadyExists(value),
                _ => InsertOutcome::Inserted,
            };
        }

        // First bit where the new key leaves the existing path.
        let crit = (existing_bits ^ bits).leading_zeros() as u8;

        // Find the link the new branch is spliced into: the first node whose
        // bit index is not above `crit`.
        let mut parent: Option<(NodeId, usize)> = None;
        let mut cursor = root;
        while let Node::Branch { bit, children, .. } = &self.nodes[cursor] {
            if *bit >= crit {
                break;
            }
            let side = bit_at(bits, *bit);
            parent = Some((cursor, side));
            cursor = children[side];
        }

        let leaf = self.alloc(Node::Leaf { key, value });
        let side = bit_at(bits, crit);
        let mut children = [cursor; 2];
        children[side] = leaf;
        let branch = self.alloc(Node::Branch {
            bit: crit,
            prefix: bits & prefix_mask(crit),
            children,
        });
        self.relink(parent, branch);
        self.len += 1;
        InsertOutcome::Inserted
    }

    /// Detaches `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let bits = key.bits();
        let mut grandparent: Option<(NodeId, usize)> = None;
        let mut parent: Option<(NodeId, usize)> = None;
        let mut cursor = self.root?;
        while let Node::Branch { bit, children, .. } = &self.nodes[cursor] {
            let side = bit_at(bits, *bit);
            grandparent = parent;
            parent = Some((cursor, side));
            cursor = children[side];
        }
        match &self.nodes[cursor] {
            Node::Leaf { key: k, .. } if k == key => {}
            _ => return None,
        }

        match parent {
            None => self.root = None,
            Some((branch, side)) => {
                let sibling = match &self.nodes[branch] {
                    Node::Branch { children, .. } => children[1 - side],
                    _ => return None,
                };
                self.relink(grandparent, sibling);
                self.release(branch);
            }
        }

        self.len -= 1;
        match self.release(cursor) {
            Node::Leaf { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Smallest key in the tree.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.leaf_entry(self.leftmost(self.root?))
    }

    /// Smallest key `>= key`.
    pub fn seek(&self, key: &K) -> Option<(&K, &V)> {
        let leaf = self.lower_bound(self.root?, key.bits(), true)?;
        self.leaf_entry(leaf)
    }

    /// Smallest key strictly greater than `key`. `key` need not be present.
    pub fn next_after(&self, key: &K) -> Option<(&K, &V)> {
        let leaf = self.lower_bound(self.root?, key.bits(), false)?;
        self.leaf_entry(leaf)
    }

    /// Iterates over all entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Drops every entry and releases the arena.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
    }

    /// Follows `bits` down to a leaf. The leaf shares the longest checked
    /// prefix with `bits` but may hold a different key.
    fn closest_leaf(&self, bits: u64) -> Option<NodeId> {
        let mut cursor = self.root?;
        loop {
            match &self.nodes[cursor] {
                Node::Branch { bit, children, .. } => cursor = children[bit_at(bits, *bit)],
                Node::Leaf { .. } => return Some(cursor),
                Node::Vacant => return None,
            }
        }
    }

    fn leftmost(&self, mut cursor: NodeId) -> NodeId {
        while let Node::Branch { children, .. } = &self.nodes[cursor] {
            cursor = children[0];
        }
        cursor
    }

    fn lower_bound(&self, node: NodeId, bits: u64, inclusive: bool) -> Option<NodeId> {
        match &self.nodes[node] {
            Node::Leaf { key, .. } => {
                let k = key.bits();
                (k > bits || (inclusive && k == bits)).then_some(node)
            }
            Node::Branch {
                bit,
                prefix,
                children,
            } => {
                let wanted = bits & prefix_mask(*bit);
                if wanted < *prefix {
                    return Some(self.leftmost(node));
                }
                if wanted > *prefix {
                    return None;
                }
                if bit_at(bits, *bit) == 0 {
                    self.lower_bound(children[0], bits, inclusive)
                        .or_else(|| Some(self.leftmost(children[1])))
                } else {
                    self.lower_bound(children[1], bits, inclusive)
                }
            }
            Node::Vacant => None,
        }
    }

    fn leaf_entry(&self, node: NodeId) -> Option<(&K, &V)> {
        match &self.nodes[node] {
            Node::Leaf { key, value } => Some((key, value)),
            _ => None,
        }
    }

    fn relink(&mut self, parent: Option<(NodeId, usize)>, target: NodeId) {
        match parent {
            None => self.root = Some(target),
            Some((branch, side)) => {
                if let Node::Branch { children, .. } = &mut self.nodes[branch] {
                    children[side] = target;
                }
            }
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, slot: NodeId) -> Node<K, V> {
        self.free.push(slot);
        mem::replace(&mut self.nodes[slot], Node::Vacant)
    }
}

/// In-order iterator over a [`RadixTree`].
pub struct Iter<'a, K, V> {
    tree: &'a RadixTree<K, V>,
    stack: Vec<NodeId>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match &self.tree.nodes[node] {
                Node::Branch { children, .. } => {
                    self.stack.push(children[1]);
                    self.stack.push(children[0]);
                }
                Node::Leaf { key, value } => return Some((key, value)),
                Node::Vacant => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct K(u64);

    impl RadixKey for K {
        fn bits(&self) -> u64 {
            self.0
        }
    }

    fn keys(tree: &RadixTree<K, u32>) -> Vec<u64> {
        tree.iter().map(|(k, _)| k.0).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let mut tree = RadixTree::new();
        assert!(tree.insert(K(5), 50).is_inserted());
        assert!(tree.insert(K(3), 30).is_inserted());
        assert!(tree.insert(K(u64::MAX), 1).is_inserted());
        assert!(tree.insert(K(0), 0).is_inserted());

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(&K(5)), Some(&50));
        assert_eq!(tree.get(&K(0)), Some(&0));
        assert_eq!(tree.get(&K(4)), None);
    }

    #[test]
    fn test_duplicate_insert_returns_existing() {
        let mut tree = RadixTree::new();
        tree.insert(K(7), 1);
        assert_eq!(tree.insert(K(7), 2), InsertOutcome::AlreadyExists(&1));
        assert_eq!(tree.get(&K(7)), Some(&1));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_remove_collapses_branches() {
        let mut tree = RadixTree::new();
        for k in [1, 2, 3, 8, 9] {
            tree.insert(K(k), k as u32);
        }
        assert_eq!(tree.remove(&K(2)), Some(2));
        assert_eq!(tree.remove(&K(2)), None);
        assert_eq!(tree.remove(&K(4)), None);
        assert_eq!(keys(&tree), vec![1, 3, 8, 9]);

        for k in [1, 3, 8, 9] {
            assert_eq!(tree.remove(&K(k)), Some(k as u32));
        }
        assert!(tree.is_empty());
        assert_eq!(tree.first(), None);
    }

    #[test]
    fn test_slots_are_reused() {
        let mut tree = RadixTree::new();
        for k in 0..16 {
            tree.insert(K(k), 0);
        }
        let arena = tree.nodes.len();
        for k in 0..16 {
            tree.remove(&K(k));
        }
        for k in 100..116 {
            tree.insert(K(k), 0);
        }
        assert_eq!(tree.nodes.len(), arena);
    }

    #[test]
    fn test_seek_and_next_after() {
        let mut tree = RadixTree::new();
        for k in [10, 20, 30, 0x8000_0000_0000_0000] {
            tree.insert(K(k), 0);
        }

        assert_eq!(tree.seek(&K(20)).map(|(k, _)| k.0), Some(20));
        assert_eq!(tree.next_after(&K(20)).map(|(k, _)| k.0), Some(30));
        assert_eq!(tree.seek(&K(21)).map(|(k, _)| k.0), Some(30));
        assert_eq!(tree.next_after(&K(0)).map(|(k, _)| k.0), Some(10));
        assert_eq!(
            tree.next_after(&K(30)).map(|(k, _)| k.0),
            Some(0x8000_0000_0000_0000)
        );
        assert_eq!(tree.next_after(&K(0x8000_0000_0000_0000)), None);
        assert_eq!(tree.seek(&K(u64::MAX)), None);
    }

    #[test]
    fn test_randomized_against_btreemap() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x5a1_fdb);
        let mut tree = RadixTree::new();
        let mut model = BTreeMap::new();

        let mut pool: Vec<u64> = (0..512).map(|_| rng.gen::<u64>() & 0x0fff_0000_00ff_ffff).collect();
        pool.shuffle(&mut rng);

        for step in 0..4000u32 {
            let k = pool[rng.gen_range(0..pool.len())];
            if rng.gen_bool(0.6) {
                let inserted = tree.insert(K(k), step).is_inserted();
                assert_eq!(inserted, !model.contains_key(&k));
                model.entry(k).or_insert(step);
            } else {
                assert_eq!(tree.remove(&K(k)), model.remove(&k));
            }

            let target = pool[rng.gen_range(0..pool.len())];
            assert_eq!(
                tree.next_after(&K(target)).map(|(k, v)| (k.0, *v)),
                model.range(target + 1..).next().map(|(k, v)| (*k, *v))
            );
            assert_eq!(
                tree.seek(&K(target)).map(|(k, _)| k.0),
                model.range(target..).next().map(|(k, _)| *k)
            );
        }

        assert_eq!(tree.len(), model.len());
        assert_eq!(keys(&tree), model.keys().copied().collect::<Vec<_>>());
    }
}
