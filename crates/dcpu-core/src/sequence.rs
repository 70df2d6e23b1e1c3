//! Immutable fixed-length sequence with structural-sharing updates.
//!
//! The sequence is a balanced binary tree whose shape is fixed by its length
//! at construction time: an internal node of length `n` owns a left child of
//! length `(n + 1) / 2` and a right child holding the remainder. [`set`]
//! rebuilds only the nodes on the path from the root to the changed leaf and
//! shares every other subtree with the receiver through [`Arc`].
//!
//! [`set`]: PersistentSequence::set

use std::fmt;
use std::sync::Arc;

use crate::fault::SequenceError;

#[derive(Debug)]
enum Node<T> {
    Leaf(T),
    Branch {
        len: usize,
        left: Arc<Node<T>>,
        right: Arc<Node<T>>,
    },
}

impl<T> Node<T> {
    const fn len(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Branch { len, .. } => *len,
        }
    }

    fn build(len: usize, leaf: &mut impl FnMut() -> T) -> Arc<Self> {
        debug_assert!(len > 0);
        if len == 1 {
            return Arc::new(Self::Leaf(leaf()));
        }
        let left_len = (len + 1) / 2;
        let left = Self::build(left_len, leaf);
        let right = Self::build(len - left_len, leaf);
        Arc::new(Self::Branch { len, left, right })
    }

    fn with_leaf(&self, index: usize, value: T) -> Arc<Self> {
        match self {
            Self::Leaf(_) => Arc::new(Self::Leaf(value)),
            Self::Branch { len, left, right } => {
                let left_len = left.len();
                if index < left_len {
                    Arc::new(Self::Branch {
                        len: *len,
                        left: left.with_leaf(index, value),
                        right: Arc::clone(right),
                    })
                } else {
                    Arc::new(Self::Branch {
                        len: *len,
                        left: Arc::clone(left),
                        right: right.with_leaf(index - left_len, value),
                    })
                }
            }
        }
    }
}

/// Immutable fixed-length sequence with `O(log n)` reads and updates.
///
/// Cloning is `O(1)`; clones share the whole tree. Values produced by
/// [`PersistentSequence::set`] never disturb the sequence they came from, so
/// any number of versions can be retained and read from other threads.
pub struct PersistentSequence<T> {
    root: Option<Arc<Node<T>>>,
}

impl<T> Clone for PersistentSequence<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<T: Default> PersistentSequence<T> {
    /// Builds a sequence of `len` default-valued elements in `O(len)`.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self::from_fn(len, |_| T::default())
    }
}

impl<T: Clone> PersistentSequence<T> {
    /// Builds a sequence with the same shape as [`PersistentSequence::new`],
    /// seeded from `source`.
    #[must_use]
    pub fn from_slice(source: &[T]) -> Self {
        Self::from_fn(source.len(), |index| source[index].clone())
    }

    /// Returns a new sequence with element `index` replaced by `value`.
    ///
    /// The receiver is left untouched. Every subtree off the root-to-leaf
    /// path is shared with the receiver.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError`] when `index >= self.len()`.
    pub fn set(&self, index: usize, value: T) -> Result<Self, SequenceError> {
        match &self.root {
            Some(root) if index < root.len() => Ok(Self {
                root: Some(root.with_leaf(index, value)),
            }),
            _ => Err(self.out_of_bounds(index)),
        }
    }

    /// Copies the elements into a vector in index order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> PersistentSequence<T> {
    /// Builds a sequence of `len` elements produced by `f(index)`.
    #[must_use]
    pub fn from_fn(len: usize, mut f: impl FnMut(usize) -> T) -> Self {
        if len == 0 {
            return Self { root: None };
        }
        let mut next = 0;
        let root = Node::build(len, &mut || {
            let value = f(next);
            next += 1;
            value
        });
        Self { root: Some(root) }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.len())
    }

    /// Returns `true` for the zero-length sequence.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Reads element `index` in `O(log len)`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError`] when `index >= self.len()`.
    pub fn get(&self, index: usize) -> Result<&T, SequenceError> {
        let Some(mut node) = self.root.as_deref() else {
            return Err(self.out_of_bounds(index));
        };
        if index >= node.len() {
            return Err(self.out_of_bounds(index));
        }

        let mut index = index;
        loop {
            match node {
                Node::Leaf(value) => return Ok(value),
                Node::Branch { left, right, .. } => {
                    let left_len = left.len();
                    if index < left_len {
                        node = Arc::as_ref(left);
                    } else {
                        index -= left_len;
                        node = Arc::as_ref(right);
                    }
                }
            }
        }
    }

    /// Iterates the elements in index order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    /// Returns `true` when both sequences are the same version (same root).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    fn out_of_bounds(&self, index: usize) -> SequenceError {
        SequenceError {
            index,
            len: self.len(),
        }
    }
}

/// In-order iterator over a [`PersistentSequence`].
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                Node::Leaf(value) => return Some(value),
                Node::Branch { left, right, .. } => {
                    self.stack.push(Arc::as_ref(right));
                    self.stack.push(Arc::as_ref(left));
                }
            }
        }
        None
    }
}

impl<'a, T> IntoIterator for &'a PersistentSequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn nodes_eq<T: PartialEq>(a: &Arc<Node<T>>, b: &Arc<Node<T>>) -> bool {
    if Arc::ptr_eq(a, b) {
        return true;
    }
    match (a.as_ref(), b.as_ref()) {
        (Node::Leaf(x), Node::Leaf(y)) => x == y,
        (
            Node::Branch {
                len: la,
                left: l1,
                right: r1,
            },
            Node::Branch {
                len: lb,
                left: l2,
                right: r2,
            },
        ) => la == lb && nodes_eq(l1, l2) && nodes_eq(r1, r2),
        _ => false,
    }
}

// Shape is a function of length, so equal lengths line the trees up node for
// node and shared subtrees short-circuit the walk.
impl<T: PartialEq> PartialEq for PersistentSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => nodes_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Eq> Eq for PersistentSequence<T> {}

impl<T: fmt::Debug> fmt::Debug for PersistentSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
