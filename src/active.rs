use std::{cmp::Ordering, collections::HashMap, iter::successors};

use itertools::Itertools;
use slab::Slab;

#[derive(Debug, Clone)]
struct Node {
    /// Key of the segment in the caller's storage.
    key: usize,
    /// Back-reference used only for walks; never owning.
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>,
    height: i32,
}

/// The active segments of a sweep, kept in a height-balanced (AVL)
/// binary search tree.
///
/// Nodes live in an arena and refer to each other by index. A node is
/// owned by exactly one slot: its parent's child link, or the root.
/// The tree stores segment keys; ordering is looked up in a storage
/// slab passed to each call, so the stored order may be refreshed
/// (see [`ActiveTree::recompute`]) while the segments are active.
#[derive(Debug, Default)]
pub struct ActiveTree {
    nodes: Slab<Node>,
    root: Option<usize>,
    handles: HashMap<usize, usize>,
}

impl ActiveTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn contains(&self, key: usize) -> bool {
        self.handles.contains_key(&key)
    }

    /// Insert the segment at `key` using its currently stored order.
    ///
    /// Returns `false` without changing the tree if an element
    /// comparing equal is already present.
    pub fn insert<S: Ord>(&mut self, key: usize, storage: &Slab<S>) -> bool {
        if self.contains(key) {
            return false;
        }
        let target = &storage[key];

        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.root;
        while let Some(idx) = cur {
            let node = &self.nodes[idx];
            parent = Some(idx);
            match target.cmp(&storage[node.key]) {
                Ordering::Less => {
                    go_left = true;
                    cur = node.left;
                }
                Ordering::Greater => {
                    go_left = false;
                    cur = node.right;
                }
                Ordering::Equal => return false,
            }
        }

        let idx = self.nodes.insert(Node {
            key,
            parent,
            left: None,
            right: None,
            height: 0,
        });
        match parent {
            None => self.root = Some(idx),
            Some(p) if go_left => self.nodes[p].left = Some(idx),
            Some(p) => self.nodes[p].right = Some(idx),
        }
        self.handles.insert(key, idx);
        self.rebalance_from(parent);
        true
    }

    /// Remove the segment at `key`. Returns `false` if it is not in
    /// the tree.
    pub fn remove(&mut self, key: usize) -> bool {
        let idx = match self.handles.remove(&key) {
            Some(idx) => idx,
            None => return false,
        };

        // With two children, the in-order successor's key moves into
        // this node and the successor's node is unlinked instead.
        let target = match (self.nodes[idx].left, self.nodes[idx].right) {
            (Some(_), Some(right)) => {
                let succ = self.min_node(right);
                let succ_key = self.nodes[succ].key;
                self.nodes[idx].key = succ_key;
                self.handles.insert(succ_key, idx);
                succ
            }
            _ => idx,
        };

        let child = self.nodes[target].left.or(self.nodes[target].right);
        let parent = self.nodes[target].parent;
        if let Some(c) = child {
            self.nodes[c].parent = parent;
        }
        self.replace_child(parent, target, child);

        self.nodes[target].parent = None;
        self.nodes.remove(target);
        self.rebalance_from(parent);
        true
    }

    /// Key of the segment immediately below `key`.
    pub fn prev_key(&self, key: usize) -> Option<usize> {
        let idx = *self.handles.get(&key)?;
        self.predecessor(idx).map(|n| self.nodes[n].key)
    }

    /// Key of the segment immediately above `key`.
    pub fn next_key(&self, key: usize) -> Option<usize> {
        let idx = *self.handles.get(&key)?;
        self.successor(idx).map(|n| self.nodes[n].key)
    }

    /// Keys of all active segments, bottom to top.
    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes_in_order().map(move |idx| self.nodes[idx].key)
    }

    /// Refresh the stored order of every active segment.
    ///
    /// `update` is applied to each active segment in storage. If the
    /// refreshed order disagrees with the tree, the keys are sorted and
    /// re-seated into the existing nodes in order; the shape (and so
    /// the balance) of the tree is unchanged. Returns `true` if
    /// re-seating was needed.
    pub fn recompute<S, F>(&mut self, storage: &mut Slab<S>, mut update: F) -> bool
    where
        S: Ord,
        F: FnMut(&mut S),
    {
        let order: Vec<usize> = self.nodes_in_order().collect();
        for &idx in &order {
            update(&mut storage[self.nodes[idx].key]);
        }

        let sorted = order
            .iter()
            .tuple_windows()
            .all(|(&a, &b)| storage[self.nodes[a].key] < storage[self.nodes[b].key]);
        if sorted {
            return false;
        }

        let mut keys: Vec<usize> = order.iter().map(|&idx| self.nodes[idx].key).collect();
        keys.sort_by(|&a, &b| storage[a].cmp(&storage[b]));
        for (&idx, &key) in order.iter().zip(&keys) {
            self.nodes[idx].key = key;
            self.handles.insert(key, idx);
        }
        true
    }

    fn nodes_in_order(&self) -> impl Iterator<Item = usize> + '_ {
        successors(self.root.map(|r| self.min_node(r)), move |&idx| self.successor(idx))
    }

    fn min_node(&self, mut idx: usize) -> usize {
        while let Some(left) = self.nodes[idx].left {
            idx = left;
        }
        idx
    }

    fn max_node(&self, mut idx: usize) -> usize {
        while let Some(right) = self.nodes[idx].right {
            idx = right;
        }
        idx
    }

    fn successor(&self, idx: usize) -> Option<usize> {
        if let Some(right) = self.nodes[idx].right {
            return Some(self.min_node(right));
        }
        let mut cur = idx;
        while let Some(parent) = self.nodes[cur].parent {
            if self.nodes[parent].left == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    fn predecessor(&self, idx: usize) -> Option<usize> {
        if let Some(left) = self.nodes[idx].left {
            return Some(self.max_node(left));
        }
        let mut cur = idx;
        while let Some(parent) = self.nodes[cur].parent {
            if self.nodes[parent].right == Some(cur) {
                return Some(parent);
            }
            cur = parent;
        }
        None
    }

    #[inline]
    fn height(&self, idx: Option<usize>) -> i32 {
        idx.map_or(-1, |i| self.nodes[i].height)
    }

    fn update_height(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        let height = 1 + self.height(node.left).max(self.height(node.right));
        self.nodes[idx].height = height;
    }

    fn balance_factor(&self, idx: usize) -> i32 {
        let node = &self.nodes[idx];
        self.height(node.left) - self.height(node.right)
    }

    /// Point the link that owns `old` at `new` instead.
    fn replace_child(&mut self, parent: Option<usize>, old: usize, new: Option<usize>) {
        match parent {
            None => self.root = new,
            Some(p) if self.nodes[p].left == Some(old) => self.nodes[p].left = new,
            Some(p) => {
                debug_assert_eq!(self.nodes[p].right, Some(old), "broken parent link");
                self.nodes[p].right = new;
            }
        }
    }

    fn rotate_left(&mut self, idx: usize) -> usize {
        let pivot = self.nodes[idx]
            .right
            .expect("left rotation requires a right child");
        let inner = self.nodes[pivot].left;
        let parent = self.nodes[idx].parent;

        self.nodes[idx].right = inner;
        if let Some(i) = inner {
            self.nodes[i].parent = Some(idx);
        }
        self.nodes[pivot].left = Some(idx);
        self.nodes[idx].parent = Some(pivot);
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, idx, Some(pivot));

        self.update_height(idx);
        self.update_height(pivot);
        pivot
    }

    fn rotate_right(&mut self, idx: usize) -> usize {
        let pivot = self.nodes[idx]
            .left
            .expect("right rotation requires a left child");
        let inner = self.nodes[pivot].right;
        let parent = self.nodes[idx].parent;

        self.nodes[idx].left = inner;
        if let Some(i) = inner {
            self.nodes[i].parent = Some(idx);
        }
        self.nodes[pivot].right = Some(idx);
        self.nodes[idx].parent = Some(pivot);
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, idx, Some(pivot));

        self.update_height(idx);
        self.update_height(pivot);
        pivot
    }

    /// Walk up from `start` to the root, fixing heights and rotating
    /// any node whose balance factor left {-1, 0, 1}.
    fn rebalance_from(&mut self, start: Option<usize>) {
        let mut cur = start;
        while let Some(idx) = cur {
            self.update_height(idx);
            let top = match self.balance_factor(idx) {
                bf if bf > 1 => {
                    let left = self.nodes[idx]
                        .left
                        .expect("left-heavy node without left child");
                    if self.balance_factor(left) < 0 {
                        self.rotate_left(left);
                    }
                    self.rotate_right(idx)
                }
                bf if bf < -1 => {
                    let right = self.nodes[idx]
                        .right
                        .expect("right-heavy node without right child");
                    if self.balance_factor(right) > 0 {
                        self.rotate_right(right);
                    }
                    self.rotate_left(idx)
                }
                _ => idx,
            };
            cur = self.nodes[top].parent;
        }
    }

    /// Validate the tree structure against `storage`.
    ///
    /// Panics on a broken parent link, a stale height, an unbalanced
    /// node, keys out of order or a stale handle.
    #[cfg(any(test, feature = "slow-asserts"))]
    pub fn check_invariants<S: Ord + std::fmt::Debug>(&self, storage: &Slab<S>) {
        fn visit(tree: &ActiveTree, idx: usize, parent: Option<usize>) -> i32 {
            let node = &tree.nodes[idx];
            assert_eq!(node.parent, parent, "parent link of node {}", idx);
            assert_eq!(tree.handles.get(&node.key), Some(&idx), "handle of key {}", node.key);
            let lh = node.left.map_or(-1, |l| visit(tree, l, Some(idx)));
            let rh = node.right.map_or(-1, |r| visit(tree, r, Some(idx)));
            assert_eq!(node.height, 1 + lh.max(rh), "height of node {}", idx);
            assert!((lh - rh).abs() <= 1, "node {} is unbalanced", idx);
            node.height
        }

        if let Some(root) = self.root {
            visit(self, root, None);
        }
        assert_eq!(self.handles.len(), self.nodes.len());
        for (a, b) in self.keys().tuple_windows() {
            assert!(
                storage[a] < storage[b],
                "active segments out of order: {:?} !< {:?}",
                storage[a],
                storage[b]
            );
        }
    }
}
