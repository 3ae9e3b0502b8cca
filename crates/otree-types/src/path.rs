//! Persistent, parent-linked position paths.
//!
//! A [`Path`] locates a node from the root of a tree as the sequence of child
//! keys taken on the way down. Paths are immutable: [`Path::append`] allocates
//! one new segment that shares the whole parent chain, so the many paths a
//! traversal produces share their common prefixes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

struct Segment<I> {
    key: I,
    parent: Option<Arc<Segment<I>>>,
}

/// The address of a tree position, stored leaf-to-root.
///
/// The empty path is the root. Two paths are equal when they have the same
/// length and every pair of keys (compared leaf-to-root) is equal; callers
/// with non-primitive key equality use [`Path::equals_by`].
pub struct Path<I> {
    head: Option<Arc<Segment<I>>>,
    len: usize,
}

impl<I> Path<I> {
    /// The root path (no keys).
    pub const fn root() -> Self {
        Self { head: None, len: 0 }
    }

    /// Build a path from keys in root-to-leaf order.
    pub fn from_keys<It: IntoIterator<Item = I>>(keys: It) -> Self {
        keys.into_iter()
            .fold(Self::root(), |path, key| path.append(key))
    }

    /// A new path one level deeper. `self` is left untouched.
    pub fn append(&self, key: I) -> Self {
        Self {
            head: Some(Arc::new(Segment {
                key,
                parent: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Number of keys in the path.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.len == 0
    }

    /// Alias for [`Path::is_root`].
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    /// The leaf-most key, if any.
    pub fn last(&self) -> Option<&I> {
        self.head.as_deref().map(|seg| &seg.key)
    }

    /// The path of the parent position. `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let seg = self.head.as_deref()?;
        Some(Self {
            head: seg.parent.clone(),
            len: self.len - 1,
        })
    }

    /// Iterate keys from leaf to root.
    pub fn keys(&self) -> Keys<'_, I> {
        Keys {
            next: self.head.as_deref(),
        }
    }

    /// Compare with `other` using a caller-supplied key equality.
    pub fn equals_by<F>(&self, other: &Self, mut eq: F) -> bool
    where
        F: FnMut(&I, &I) -> bool,
    {
        if self.len != other.len {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.head, &other.head) {
            if Arc::ptr_eq(a, b) {
                return true;
            }
        }
        self.keys().zip(other.keys()).all(|(a, b)| eq(a, b))
    }

    /// Returns `true` if `prefix` addresses this position or one of its
    /// ancestors.
    pub fn starts_with_by<F>(&self, prefix: &Self, eq: F) -> bool
    where
        F: FnMut(&I, &I) -> bool,
    {
        if prefix.len > self.len {
            return false;
        }
        self.truncated(prefix.len).equals_by(prefix, eq)
    }

    /// The ancestor path holding the first `len` keys.
    fn truncated(&self, len: usize) -> Self {
        let mut path = self.clone();
        while path.len > len {
            // len > 0 implies a head segment
            path = match path.parent() {
                Some(parent) => parent,
                None => break,
            };
        }
        path
    }

    /// Keys in root-to-leaf order.
    pub fn to_vec(&self) -> Vec<I>
    where
        I: Clone,
    {
        let mut keys: Vec<I> = self.keys().cloned().collect();
        keys.reverse();
        keys
    }

    /// A `/`-separated rendering using each key's `Debug` form.
    ///
    /// Used to tag errors with the position they occurred at.
    pub fn to_debug_string(&self) -> String
    where
        I: fmt::Debug,
    {
        if self.is_root() {
            return "/".to_string();
        }
        let mut keys: Vec<&I> = self.keys().collect();
        keys.reverse();
        keys.iter().map(|k| format!("/{k:?}")).collect()
    }
}

/// Leaf-to-root key iterator returned by [`Path::keys`].
pub struct Keys<'a, I> {
    next: Option<&'a Segment<I>>,
}

impl<'a, I> Iterator for Keys<'a, I> {
    type Item = &'a I;

    fn next(&mut self) -> Option<Self::Item> {
        let seg = self.next?;
        self.next = seg.parent.as_deref();
        Some(&seg.key)
    }
}

impl<I> Clone for Path<I> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<I> Default for Path<I> {
    fn default() -> Self {
        Self::root()
    }
}

impl<I> Drop for Path<I> {
    // Unlink uniquely-owned segments iteratively so long paths cannot
    // overflow the stack through recursive Arc drops.
    fn drop(&mut self) {
        let mut next = self.head.take();
        while let Some(seg) = next {
            match Arc::try_unwrap(seg) {
                Ok(mut seg) => next = seg.parent.take(),
                Err(_) => break,
            }
        }
    }
}

impl<I: PartialEq> PartialEq for Path<I> {
    fn eq(&self, other: &Self) -> bool {
        self.equals_by(other, |a, b| a == b)
    }
}

impl<I: Eq> Eq for Path<I> {}

impl<I: Hash> Hash for Path<I> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        for key in self.keys() {
            key.hash(state);
        }
    }
}

impl<I> FromIterator<I> for Path<I> {
    fn from_iter<It: IntoIterator<Item = I>>(iter: It) -> Self {
        Self::from_keys(iter)
    }
}

impl<I: fmt::Debug> fmt::Debug for Path<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&I> = self.keys().collect();
        keys.reverse();
        f.debug_tuple("Path").field(&keys).finish()
    }
}

impl<I: fmt::Display> fmt::Display for Path<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        let mut keys: Vec<&I> = self.keys().collect();
        keys.reverse();
        for key in keys {
            write!(f, "/{key}")?;
        }
        Ok(())
    }
}

impl<I: Serialize> Serialize for Path<I> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut keys: Vec<&I> = self.keys().collect();
        keys.reverse();
        serializer.collect_seq(keys)
    }
}

impl<'de, I: Deserialize<'de>> Deserialize<'de> for Path<I> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<I>::deserialize(deserializer)?;
        Ok(Self::from_keys(keys))
    }
}
