//! Red-black tree over an [`Arena`], ordered by key.
//!
//! Links are raw slot indices, with `NIL` standing in for the black external
//! sentinel. Callers hold a [`NodeHandle`] that stays valid until the node is
//! removed, however many rotations move the node around the tree.
//!
//! Both fixups walk the parent chain iteratively, so no operation recurses
//! on tree depth.

use std::cmp::Ordering;

use crate::arena::{Arena, Handle};
use crate::errors::IndexError;

const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(Handle);

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: usize,
    left: usize,
    right: usize,
}

#[derive(Debug, Clone)]
pub struct OrderedIndex<K, V> {
    nodes: Arena<Node<K, V>>,
    root: usize,
}

impl<K: Ord + Copy, V> Default for OrderedIndex<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy, V> OrderedIndex<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: NIL,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            root: NIL,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Inserts `value` under `key`. An existing key is left untouched and
    /// reported as [`IndexError::DuplicateKey`].
    pub fn insert(&mut self, key: K, value: V) -> Result<NodeHandle, IndexError> {
        let mut parent = NIL;
        let mut current = self.root;
        let mut to_left = false;

        while current != NIL {
            parent = current;
            let node = &self.nodes[current];
            match key.cmp(&node.key) {
                Ordering::Less => {
                    current = node.left;
                    to_left = true;
                }
                Ordering::Greater => {
                    current = node.right;
                    to_left = false;
                }
                Ordering::Equal => return Err(IndexError::DuplicateKey),
            }
        }

        let handle = self.nodes.insert(Node {
            key,
            value,
            color: Color::Red,
            parent,
            left: NIL,
            right: NIL,
        });
        let idx = handle.index();

        if parent == NIL {
            self.root = idx;
        } else if to_left {
            self.nodes[parent].left = idx;
        } else {
            self.nodes[parent].right = idx;
        }

        self.insert_fixup(idx);
        Ok(NodeHandle(handle))
    }

    pub fn find(&self, key: &K) -> Option<&V> {
        match self.locate(key) {
            NIL => None,
            idx => Some(&self.nodes[idx].value),
        }
    }

    pub fn find_handle(&self, key: &K) -> Option<NodeHandle> {
        match self.locate(key) {
            NIL => None,
            idx => self.nodes.handle_at(idx).map(NodeHandle),
        }
    }

    pub fn get(&self, handle: NodeHandle) -> Option<&V> {
        self.nodes.get(handle.0).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut V> {
        self.nodes.get_mut(handle.0).map(|node| &mut node.value)
    }

    pub fn key(&self, handle: NodeHandle) -> Option<K> {
        self.nodes.get(handle.0).map(|node| node.key)
    }

    /// Removes a node by handle in O(log n). Stale handles return `None`.
    pub fn remove(&mut self, handle: NodeHandle) -> Option<(K, V)> {
        if !self.nodes.contains(handle.0) {
            return None;
        }

        self.unlink(handle.0.index());
        self.nodes.remove(handle.0).map(|node| (node.key, node.value))
    }

    pub fn remove_key(&mut self, key: &K) -> Option<(K, V)> {
        let handle = self.find_handle(key)?;
        self.remove(handle)
    }

    /// Entries with `lo <= key <= hi` in ascending key order. Empty when
    /// `lo > hi`.
    pub fn range(&self, lo: &K, hi: &K) -> Vec<(K, &V)> {
        let mut found = Vec::new();
        if lo > hi {
            return found;
        }

        let mut stack = Vec::new();
        let mut current = self.root;

        loop {
            while current != NIL {
                let node = &self.nodes[current];
                if node.key < *lo {
                    current = node.right;
                } else {
                    stack.push(current);
                    current = node.left;
                }
            }

            let Some(idx) = stack.pop() else {
                break;
            };
            let node = &self.nodes[idx];
            if node.key > *hi {
                break;
            }
            found.push((node.key, &node.value));
            current = node.right;
        }

        found
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            index: self,
            stack: Vec::new(),
        };
        iter.push_left(self.root);
        iter
    }

    fn locate(&self, key: &K) -> usize {
        let mut current = self.root;
        while current != NIL {
            let node = &self.nodes[current];
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return current,
            };
        }
        NIL
    }

    fn insert_fixup(&mut self, mut node: usize) {
        while self.is_red(self.parent(node)) {
            let parent = self.parent(node);
            // A red parent is never the root, so the grandparent exists.
            let grandparent = self.parent(parent);

            if parent == self.left(grandparent) {
                let uncle = self.right(grandparent);
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.right(parent) {
                        node = parent;
                        self.rotate_left(node);
                    }
                    let parent = self.parent(node);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_right(grandparent);
                }
            } else {
                let uncle = self.left(grandparent);
                if self.is_red(uncle) {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    node = grandparent;
                } else {
                    if node == self.left(parent) {
                        node = parent;
                        self.rotate_right(node);
                    }
                    let parent = self.parent(node);
                    let grandparent = self.parent(parent);
                    self.set_color(parent, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate_left(grandparent);
                }
            }
        }

        self.set_color(self.root, Color::Black);
    }

    /// Detaches `target` from the tree and rebalances. The arena slot is left
    /// for the caller to free.
    fn unlink(&mut self, target: usize) {
        let left = self.nodes[target].left;
        let right = self.nodes[target].right;

        let removed_color;
        let child;
        let child_parent;

        if left == NIL {
            removed_color = self.nodes[target].color;
            child = right;
            child_parent = self.nodes[target].parent;
            self.transplant(target, right);
        } else if right == NIL {
            removed_color = self.nodes[target].color;
            child = left;
            child_parent = self.nodes[target].parent;
            self.transplant(target, left);
        } else {
            let successor = self.minimum(right);
            removed_color = self.nodes[successor].color;
            child = self.nodes[successor].right;

            if self.nodes[successor].parent == target {
                child_parent = successor;
            } else {
                child_parent = self.nodes[successor].parent;
                self.transplant(successor, child);
                self.nodes[successor].right = right;
                self.nodes[right].parent = successor;
            }

            self.transplant(target, successor);
            self.nodes[successor].left = left;
            self.nodes[left].parent = successor;
            self.nodes[successor].color = self.nodes[target].color;
        }

        if removed_color == Color::Black {
            self.delete_fixup(child, child_parent);
        }
    }

    /// `node` carries an extra black. `parent` is tracked separately since
    /// `node` may be `NIL`.
    fn delete_fixup(&mut self, mut node: usize, mut parent: usize) {
        while node != self.root && self.is_black(node) {
            if node == self.left(parent) {
                let mut sibling = self.right(parent);

                if self.is_red(sibling) {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.right(parent);
                }

                if self.is_black(self.left(sibling)) && self.is_black(self.right(sibling)) {
                    self.set_color(sibling, Color::Red);
                    node = parent;
                    parent = self.parent(node);
                } else {
                    if self.is_black(self.right(sibling)) {
                        self.set_color(self.left(sibling), Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.right(parent);
                    }

                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(self.right(sibling), Color::Black);
                    self.rotate_left(parent);
                    node = self.root;
                }
            } else {
                let mut sibling = self.left(parent);

                if self.is_red(sibling) {
                    self.set_color(sibling, Color::Black);
                    self.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.left(parent);
                }

                if self.is_black(self.right(sibling)) && self.is_black(self.left(sibling)) {
                    self.set_color(sibling, Color::Red);
                    node = parent;
                    parent = self.parent(node);
                } else {
                    if self.is_black(self.left(sibling)) {
                        self.set_color(self.right(sibling), Color::Black);
                        self.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.left(parent);
                    }

                    self.set_color(sibling, self.color(parent));
                    self.set_color(parent, Color::Black);
                    self.set_color(self.left(sibling), Color::Black);
                    self.rotate_right(parent);
                    node = self.root;
                }
            }
        }

        self.set_color(node, Color::Black);
    }

    fn rotate_left(&mut self, node: usize) {
        let pivot = self.nodes[node].right;
        let inner = self.nodes[pivot].left;

        self.nodes[node].right = inner;
        if inner != NIL {
            self.nodes[inner].parent = node;
        }

        let parent = self.nodes[node].parent;
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, node, pivot);

        self.nodes[pivot].left = node;
        self.nodes[node].parent = pivot;
    }

    fn rotate_right(&mut self, node: usize) {
        let pivot = self.nodes[node].left;
        let inner = self.nodes[pivot].right;

        self.nodes[node].left = inner;
        if inner != NIL {
            self.nodes[inner].parent = node;
        }

        let parent = self.nodes[node].parent;
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, node, pivot);

        self.nodes[pivot].right = node;
        self.nodes[node].parent = pivot;
    }

    /// Puts `new` where `old` hung off `parent` (or at the root).
    fn replace_child(&mut self, parent: usize, old: usize, new: usize) {
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    fn transplant(&mut self, old: usize, new: usize) {
        let parent = self.nodes[old].parent;
        self.replace_child(parent, old, new);
        if new != NIL {
            self.nodes[new].parent = parent;
        }
    }

    fn minimum(&self, mut node: usize) -> usize {
        while self.nodes[node].left != NIL {
            node = self.nodes[node].left;
        }
        node
    }

    fn parent(&self, node: usize) -> usize {
        if node == NIL {
            NIL
        } else {
            self.nodes[node].parent
        }
    }

    fn left(&self, node: usize) -> usize {
        if node == NIL {
            NIL
        } else {
            self.nodes[node].left
        }
    }

    fn right(&self, node: usize) -> usize {
        if node == NIL {
            NIL
        } else {
            self.nodes[node].right
        }
    }

    fn color(&self, node: usize) -> Color {
        if node == NIL {
            Color::Black
        } else {
            self.nodes[node].color
        }
    }

    fn set_color(&mut self, node: usize, color: Color) {
        if node != NIL {
            self.nodes[node].color = color;
        }
    }

    fn is_red(&self, node: usize) -> bool {
        self.color(node) == Color::Red
    }

    fn is_black(&self, node: usize) -> bool {
        self.color(node) == Color::Black
    }
}

/// In-order iterator over `(key, &value)`.
pub struct Iter<'a, K, V> {
    index: &'a OrderedIndex<K, V>,
    stack: Vec<usize>,
}

impl<'a, K: Ord + Copy, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut node: usize) {
        while node != NIL {
            self.stack.push(node);
            node = self.index.nodes[node].left;
        }
    }
}

impl<'a, K: Ord + Copy, V> Iterator for Iter<'a, K, V> {
    type Item = (K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let index = self.index;
        let node = &index.nodes[idx];
        self.push_left(node.right);
        Some((node.key, &node.value))
    }
}

#[cfg(test)]
impl<K: Ord + Copy + std::fmt::Debug, V> OrderedIndex<K, V> {
    /// Asserts every red-black and linkage property; returns the node count.
    pub(crate) fn assert_invariants(&self) -> usize {
        if self.root == NIL {
            assert_eq!(self.len(), 0);
            return 0;
        }

        assert_eq!(self.nodes[self.root].parent, NIL, "root has a parent");
        assert!(self.is_black(self.root), "root is red");

        let mut count = 0;
        self.assert_subtree(self.root, None, None, &mut count);
        assert_eq!(count, self.len(), "reachable nodes differ from arena size");
        count
    }

    fn assert_subtree(&self, node: usize, lo: Option<K>, hi: Option<K>, count: &mut usize) -> usize {
        if node == NIL {
            return 1;
        }
        *count += 1;

        let n = &self.nodes[node];
        if let Some(lo) = lo {
            assert!(n.key > lo, "{:?} sits right of {:?} but is not larger", n.key, lo);
        }
        if let Some(hi) = hi {
            assert!(n.key < hi, "{:?} sits left of {:?} but is not smaller", n.key, hi);
        }

        for child in [n.left, n.right] {
            if child != NIL {
                assert_eq!(self.nodes[child].parent, node, "broken parent link");
                if n.color == Color::Red {
                    assert!(self.is_black(child), "red node {:?} has a red child", n.key);
                }
            }
        }

        let left_height = self.assert_subtree(n.left, lo, Some(n.key), count);
        let right_height = self.assert_subtree(n.right, Some(n.key), hi, count);
        assert_eq!(left_height, right_height, "black height differs under {:?}", n.key);

        left_height + usize::from(n.color == Color::Black)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn keys(index: &OrderedIndex<i64, &str>) -> Vec<i64> {
        index.iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_insert_ascending_stays_balanced() {
        let mut index = OrderedIndex::new();
        for key in 1..=512i64 {
            index.insert(key, key * 10).unwrap();
            index.assert_invariants();
        }

        assert_eq!(index.len(), 512);
        assert_eq!(index.find(&300), Some(&3000));
        assert_eq!(index.find(&513), None);
    }

    #[test]
    fn test_insert_duplicate_key() {
        let mut index = OrderedIndex::new();
        index.insert(5, "first").unwrap();

        assert_eq!(index.insert(5, "second"), Err(IndexError::DuplicateKey));
        assert_eq!(index.len(), 1);
        assert_eq!(index.find(&5), Some(&"first"));
    }

    #[test]
    fn test_range() {
        let mut index = OrderedIndex::new();
        for key in [50, 20, 80, 10, 30, 70, 90, 25] {
            index.insert(key, "ride").unwrap();
        }

        let range: Vec<i64> = index.range(&20, &70).into_iter().map(|(k, _)| k).collect();
        assert_eq!(range, vec![20, 25, 30, 50, 70]);

        let range: Vec<i64> = index.range(&21, &29).into_iter().map(|(k, _)| k).collect();
        assert_eq!(range, vec![25]);

        assert_eq!(index.range(&30, &30).len(), 1);
        assert!(index.range(&31, &31).is_empty());
        assert!(index.range(&70, &20).is_empty());
        assert_eq!(index.range(&i64::MIN, &i64::MAX).len(), 8);
    }

    #[test]
    fn test_remove_by_handle() {
        let mut index = OrderedIndex::new();
        let mut handles = Vec::new();
        for key in 0..32i64 {
            handles.push(index.insert(key, "ride").unwrap());
        }

        assert_eq!(index.key(handles[7]), Some(7));

        // Odd keys go by handle, so nodes with two children get spliced out
        // through their successor.
        for handle in handles.iter().skip(1).step_by(2) {
            assert!(index.remove(*handle).is_some());
            index.assert_invariants();
        }

        assert_eq!(keys(&index), (0..32).step_by(2).collect::<Vec<_>>());
        assert_eq!(index.remove(handles[1]), None);
        assert_eq!(index.get(handles[1]), None);
        assert_eq!(index.get(handles[2]), Some(&"ride"));
    }

    #[test]
    fn test_handle_survives_rotations() {
        let mut index = OrderedIndex::new();
        let handle = index.insert(1, "first").unwrap();
        for key in 2..100 {
            index.insert(key, "other").unwrap();
        }

        assert_eq!(index.get(handle), Some(&"first"));
        if let Some(value) = index.get_mut(handle) {
            *value = "changed";
        }
        assert_eq!(index.find(&1), Some(&"changed"));
    }

    #[test]
    fn test_remove_key() {
        let mut index = OrderedIndex::new();
        index.insert(3, "c").unwrap();
        index.insert(1, "a").unwrap();
        index.insert(2, "b").unwrap();

        assert_eq!(index.remove_key(&2), Some((2, "b")));
        assert_eq!(index.remove_key(&2), None);
        assert_eq!(keys(&index), vec![1, 3]);

        index.remove_key(&1);
        index.remove_key(&3);
        assert!(index.is_empty());
        assert_eq!(index.assert_invariants(), 0);
    }

    #[test]
    fn test_random_operations_match_btreemap() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut index = OrderedIndex::new();
        let mut model = BTreeMap::new();

        for step in 0..4000 {
            let key: i64 = rng.gen_range(0..300);
            if rng.gen_bool(0.55) {
                let inserted = index.insert(key, step).is_ok();
                assert_eq!(inserted, !model.contains_key(&key));
                model.entry(key).or_insert(step);
            } else {
                assert_eq!(index.remove_key(&key).map(|(_, v)| v), model.remove(&key));
            }

            assert_eq!(index.assert_invariants(), model.len());
        }

        let ours: Vec<(i64, i32)> = index.iter().map(|(k, v)| (k, *v)).collect();
        let theirs: Vec<(i64, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(ours, theirs);

        let ours: Vec<i64> = index.range(&40, &160).into_iter().map(|(k, _)| k).collect();
        let theirs: Vec<i64> = model.range(40..=160).map(|(k, _)| *k).collect();
        assert_eq!(ours, theirs);
    }
}
