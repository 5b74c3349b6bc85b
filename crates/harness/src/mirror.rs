//! OracleMirror: expected contents of the backend under test
//!
//! The mirror is the ground truth every observed result is checked
//! against. It never talks to the backend; stages apply each successful
//! backend mutation to it as well.
//!
//! # Design Notes
//!
//! - **Counted treap**: entries live in a binary search tree ordered by key
//!   where every node also records the size of its subtree. That gives
//!   O(log n) lookup, insert and delete, plus positional access: the i-th
//!   key in sorted order is found by walking subtree sizes.
//! - **Uniform sampling**: `random_existing_key` draws an index in
//!   `0..len` and selects the key at that rank, so the draw only covers
//!   live keys and a given seed always maps to the same sorted position.
//! - **Priorities**: heap priorities come from a counter mixed with
//!   splitmix64, not from the caller's generator, so inserting never
//!   perturbs the benchmark's random stream.

use std::cmp::Ordering;

use rand::Rng;
use thiserror::Error;

/// `random_existing_key` was called with no live keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("mirror holds no keys")]
pub struct EmptyMirror;

type Link = Option<Box<Node>>;

#[derive(Debug, Clone)]
struct Node {
    key: Vec<u8>,
    value: Vec<u8>,
    priority: u64,
    /// Nodes in this subtree, this one included
    size: usize,
    left: Link,
    right: Link,
}

impl Node {
    fn new(key: Vec<u8>, value: Vec<u8>, priority: u64) -> Box<Self> {
        Box::new(Self {
            key,
            value,
            priority,
            size: 1,
            left: None,
            right: None,
        })
    }

    fn resize(&mut self) {
        self.size = 1 + size(&self.left) + size(&self.right);
    }
}

fn size(link: &Link) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

/// Split into keys `< key` and keys `>= key`
fn split(link: Link, key: &[u8]) -> (Link, Link) {
    match link {
        None => (None, None),
        Some(mut node) => {
            if node.key.as_slice() < key {
                let (lower, upper) = split(node.right.take(), key);
                node.right = lower;
                node.resize();
                (Some(node), upper)
            } else {
                let (lower, upper) = split(node.left.take(), key);
                node.left = upper;
                node.resize();
                (lower, Some(node))
            }
        }
    }
}

/// Join two trees where every key of `left` sorts before every key of `right`
fn merge(left: Link, right: Link) -> Link {
    match (left, right) {
        (None, right) => right,
        (left, None) => left,
        (Some(mut left), Some(mut right)) => {
            if left.priority > right.priority {
                left.right = merge(left.right.take(), Some(right));
                left.resize();
                Some(left)
            } else {
                right.left = merge(Some(left), right.left.take());
                right.resize();
                Some(right)
            }
        }
    }
}

fn remove(link: &mut Link, key: &[u8]) -> Option<Vec<u8>> {
    let ord = key.cmp(link.as_ref()?.key.as_slice());
    let removed = match ord {
        Ordering::Equal => {
            let node = link.take()?;
            let Node {
                value, left, right, ..
            } = *node;
            *link = merge(left, right);
            return Some(value);
        }
        Ordering::Less => remove(&mut link.as_mut()?.left, key),
        Ordering::Greater => remove(&mut link.as_mut()?.right, key),
    };
    if removed.is_some() {
        if let Some(node) = link.as_mut() {
            node.size -= 1;
        }
    }
    removed
}

fn find_mut<'a>(link: &'a mut Link, key: &[u8]) -> Option<&'a mut Node> {
    let node = link.as_deref_mut()?;
    match key.cmp(node.key.as_slice()) {
        Ordering::Less => find_mut(&mut node.left, key),
        Ordering::Greater => find_mut(&mut node.right, key),
        Ordering::Equal => Some(node),
    }
}

fn splitmix64(state: u64) -> u64 {
    let mut z = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// In-memory model of what the backend should contain
#[derive(Debug, Default, Clone)]
pub struct OracleMirror {
    root: Link,
    /// Inserts so far; source of node priorities
    inserts: u64,
}

impl OracleMirror {
    /// Create an empty mirror
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        size(&self.root)
    }

    /// True when no keys are live
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// True when `key` is live
    pub fn contains(&self, key: &[u8]) -> bool {
        self.lookup(key).is_some()
    }

    /// Add a new key
    ///
    /// Returns `false` and changes nothing if the key is already present.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> bool {
        if self.contains(key) {
            return false;
        }
        self.inserts += 1;
        let node = Node::new(key.to_vec(), value.to_vec(), splitmix64(self.inserts));
        let (lower, upper) = split(self.root.take(), key);
        self.root = merge(merge(lower, Some(node)), upper);
        true
    }

    /// Replace the value of an existing key, returning the old value
    ///
    /// An absent key is left absent.
    pub fn update(&mut self, key: &[u8], value: &[u8]) -> Option<Vec<u8>> {
        let node = find_mut(&mut self.root, key)?;
        Some(std::mem::replace(&mut node.value, value.to_vec()))
    }

    /// Remove a key, returning its value
    pub fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        remove(&mut self.root, key)
    }

    /// Current value of `key`
    pub fn lookup(&self, key: &[u8]) -> Option<&[u8]> {
        let mut link = &self.root;
        while let Some(node) = link {
            match key.cmp(node.key.as_slice()) {
                Ordering::Less => link = &node.left,
                Ordering::Greater => link = &node.right,
                Ordering::Equal => return Some(node.value.as_slice()),
            }
        }
        None
    }

    /// The key at position `index` in ascending order
    pub fn key_at(&self, mut index: usize) -> Option<&[u8]> {
        let mut link = &self.root;
        while let Some(node) = link {
            let left = size(&node.left);
            match index.cmp(&left) {
                Ordering::Less => link = &node.left,
                Ordering::Equal => return Some(node.key.as_slice()),
                Ordering::Greater => {
                    index -= left + 1;
                    link = &node.right;
                }
            }
        }
        None
    }

    /// A live key chosen uniformly at random
    ///
    /// Draws a rank in `0..len` and returns the key at that position in
    /// sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyMirror`] if no keys are live.
    pub fn random_existing_key<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&[u8], EmptyMirror> {
        if self.is_empty() {
            return Err(EmptyMirror);
        }
        let index = rng.gen_range(0..self.len());
        self.key_at(index).ok_or(EmptyMirror)
    }

    /// Up to `limit` entries in ascending order, starting at the first key
    /// `>= key`
    pub fn range_from(&self, key: &[u8], limit: usize) -> Vec<(&[u8], &[u8])> {
        if limit == 0 {
            return Vec::new();
        }
        Iter::seek(&self.root, key).take(limit).collect()
    }

    /// All entries in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> + '_ {
        Iter::seek(&self.root, &[])
    }
}

/// In-order walk holding the path of pending ancestors
struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn seek(root: &'a Link, key: &[u8]) -> Self {
        let mut stack = Vec::new();
        let mut link = root;
        while let Some(node) = link {
            if node.key.as_slice() >= key {
                stack.push(&**node);
                link = &node.left;
            } else {
                link = &node.right;
            }
        }
        Self { stack }
    }

    fn push_left_spine(&mut self, mut link: &'a Link) {
        while let Some(node) = link {
            self.stack.push(&**node);
            link = &node.left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(&node.right);
        Some((node.key.as_slice(), node.value.as_slice()))
    }
}
