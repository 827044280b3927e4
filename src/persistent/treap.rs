//! Persistent treap keyed by composite integers.
//!
//! # Algorithm
//!
//! A treap (binary search tree on keys, max-heap on priorities) where
//! every update is a split/merge that *path-copies* the touched nodes and
//! shares all other sub-trees with the previous version. Old versions stay
//! valid and unchanged, so cloning a map is O(1).
//!
//! Absent keys read as `0`, and storing `0` removes the key, so the map
//! only ever holds non-zero values.
//!
//! # Complexity
//! Expected O(log n) for `get`, `set`, `remove`, `adjust`, `bounds` and
//! `sample`; O(1) for `clone` and `len`.
//!
//! # Reference
//! Seidel & Aragon (1996), "Randomized Search Trees";
//! Driscoll et al. (1989), "Making Data Structures Persistent"

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use rand::Rng;

use super::key::MapKey;

type Link<K> = Option<Arc<Node<K>>>;

struct Node<K> {
    key: K,
    value: u32,
    priority: u64,
    size: usize,
    left: Link<K>,
    right: Link<K>,
}

impl<K: MapKey> Node<K> {
    fn leaf(key: K, value: u32) -> Arc<Self> {
        Arc::new(Self {
            key,
            value,
            priority: key.priority(),
            size: 1,
            left: None,
            right: None,
        })
    }

    /// Copy of this node with new children.
    fn rebuild(&self, left: Link<K>, right: Link<K>) -> Arc<Self> {
        Arc::new(Self {
            key: self.key,
            value: self.value,
            priority: self.priority,
            size: 1 + size(&left) + size(&right),
            left,
            right,
        })
    }
}

#[inline]
fn size<K>(link: &Link<K>) -> usize {
    link.as_ref().map_or(0, |n| n.size)
}

/// Splits into (`< key`, `>= key`), or (`<= key`, `> key`) when `inclusive`.
fn split<K: MapKey>(link: &Link<K>, key: &K, inclusive: bool) -> (Link<K>, Link<K>) {
    let Some(node) = link else {
        return (None, None);
    };
    let goes_left = if inclusive {
        node.key <= *key
    } else {
        node.key < *key
    };
    if goes_left {
        let (mid, right) = split(&node.right, key, inclusive);
        (Some(node.rebuild(node.left.clone(), mid)), right)
    } else {
        let (left, mid) = split(&node.left, key, inclusive);
        (left, Some(node.rebuild(mid, node.right.clone())))
    }
}

/// Joins two treaps where every key of `left` is below every key of `right`.
fn merge<K: MapKey>(left: Link<K>, right: Link<K>) -> Link<K> {
    match (left, right) {
        (None, r) => r,
        (l, None) => l,
        (Some(l), Some(r)) => {
            if l.priority >= r.priority {
                let merged = merge(l.right.clone(), Some(r));
                Some(l.rebuild(l.left.clone(), merged))
            } else {
                let merged = merge(Some(l), r.left.clone());
                Some(r.rebuild(merged, r.right.clone()))
            }
        }
    }
}

/// Copy-on-write sparse map from a composite key to a non-zero `u32`.
///
/// # Example
/// ```
/// use u_timetable::persistent::{Key3, PersistentMap};
///
/// let v1 = PersistentMap::new().set(Key3(1, 2, 3), 7);
/// let v2 = v1.set(Key3(1, 2, 5), 9).remove(Key3(1, 2, 3));
///
/// assert_eq!(v1.get(Key3(1, 2, 3)), 7); // old version untouched
/// assert_eq!(v2.get(Key3(1, 2, 3)), 0);
/// assert_eq!(v2.bounds((1, 2)), Some((5, 5)));
/// ```
pub struct PersistentMap<K> {
    root: Link<K>,
}

impl<K> Clone for PersistentMap<K> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<K> Default for PersistentMap<K> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<K: MapKey> PersistentMap<K> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored (non-zero) entries.
    #[inline]
    pub fn len(&self) -> usize {
        size(&self.root)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Value stored at `key`, `0` if absent.
    pub fn get(&self, key: K) -> u32 {
        let mut cur = &self.root;
        while let Some(node) = cur {
            match key.cmp(&node.key) {
                Ordering::Less => cur = &node.left,
                Ordering::Greater => cur = &node.right,
                Ordering::Equal => return node.value,
            }
        }
        0
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.get(key) != 0
    }

    /// New version with `key` set to `value`; `value == 0` removes it.
    #[must_use]
    pub fn set(&self, key: K, value: u32) -> Self {
        if self.get(key) == value {
            return self.clone();
        }
        let (left, rest) = split(&self.root, &key, false);
        let (_, right) = split(&rest, &key, true);
        let middle = (value != 0).then(|| Node::leaf(key, value));
        Self {
            root: merge(merge(left, middle), right),
        }
    }

    /// New version without `key`.
    #[must_use]
    pub fn remove(&self, key: K) -> Self {
        self.set(key, 0)
    }

    /// New version with the counter at `key` shifted by `delta`.
    ///
    /// Counters never go below zero; reaching zero removes the key.
    #[must_use]
    pub fn adjust(&self, key: K, delta: i64) -> Self {
        let next = self.get(key) as i64 + delta;
        debug_assert!(next >= 0, "counter at {key:?} would go negative");
        self.set(key, next.clamp(0, u32::MAX as i64) as u32)
    }

    /// Minimum and maximum last component among keys with `prefix`.
    ///
    /// `None` if no key has that prefix.
    pub fn bounds(&self, prefix: K::Prefix) -> Option<(u32, u32)> {
        let lo = self.ceiling(K::from_parts(prefix, 0))?;
        if lo.prefix() != prefix {
            return None;
        }
        let hi = self.floor(K::from_parts(prefix, u32::MAX))?;
        Some((lo.last(), hi.last()))
    }

    /// Smallest stored key `>= key`.
    fn ceiling(&self, key: K) -> Option<K> {
        let mut cur = &self.root;
        let mut best = None;
        while let Some(node) = cur {
            if node.key >= key {
                best = Some(node.key);
                cur = &node.left;
            } else {
                cur = &node.right;
            }
        }
        best
    }

    /// Largest stored key `<= key`.
    fn floor(&self, key: K) -> Option<K> {
        let mut cur = &self.root;
        let mut best = None;
        while let Some(node) = cur {
            if node.key <= key {
                best = Some(node.key);
                cur = &node.right;
            } else {
                cur = &node.left;
            }
        }
        best
    }

    /// Uniformly random entry, `None` if empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(K, u32)> {
        let mut node = self.root.as_ref()?;
        let mut rank = rng.random_range(0..node.size);
        loop {
            let left = size(&node.left);
            match rank.cmp(&left) {
                Ordering::Less => node = node.left.as_ref()?,
                Ordering::Equal => return Some((node.key, node.value)),
                Ordering::Greater => {
                    rank -= left + 1;
                    node = node.right.as_ref()?;
                }
            }
        }
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left(&self.root);
        iter
    }

    /// Whether both maps are the very same version.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<K: MapKey> PartialEq for PersistentMap<K> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().eq(other.iter()))
    }
}

impl<K: MapKey> Eq for PersistentMap<K> {}

impl<K: MapKey> fmt::Debug for PersistentMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: MapKey> FromIterator<(K, u32)> for PersistentMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (key, value)| map.set(key, value))
    }
}

/// In-order iterator over a [`PersistentMap`].
pub struct Iter<'a, K> {
    stack: Vec<&'a Node<K>>,
}

impl<'a, K> Iter<'a, K> {
    fn push_left(&mut self, mut link: &'a Link<K>) {
        while let Some(node) = link {
            self.stack.push(&**node);
            link = &node.left;
        }
    }
}

impl<K: Copy> Iterator for Iter<'_, K> {
    type Item = (K, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(&node.right);
        Some((node.key, node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::{Key2, Key3};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::{BTreeMap, HashMap};

    /// Checks BST order, heap order and cached sizes.
    fn assert_treap<K: MapKey>(map: &PersistentMap<K>) {
        fn walk<K: MapKey>(link: &Link<K>, lo: Option<K>, hi: Option<K>) -> usize {
            let Some(node) = link else { return 0 };
            assert_ne!(node.value, 0, "zero stored at {:?}", node.key);
            if let Some(lo) = lo {
                assert!(node.key > lo);
            }
            if let Some(hi) = hi {
                assert!(node.key < hi);
            }
            for child in [&node.left, &node.right].into_iter().flatten() {
                assert!(child.priority <= node.priority);
            }
            let n = 1 + walk(&node.left, lo, Some(node.key)) + walk(&node.right, Some(node.key), hi);
            assert_eq!(node.size, n);
            n
        }
        walk(&map.root, None, None);
    }

    #[test]
    fn test_set_get_remove() {
        let m = PersistentMap::new()
            .set(Key3(1, 1, 1), 5)
            .set(Key3(1, 1, 2), 6)
            .set(Key3(2, 1, 1), 7);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(Key3(1, 1, 2)), 6);
        assert_eq!(m.get(Key3(9, 9, 9)), 0);

        let m = m.set(Key3(1, 1, 2), 8);
        assert_eq!(m.get(Key3(1, 1, 2)), 8);
        assert_eq!(m.len(), 3);

        let m = m.remove(Key3(1, 1, 1)).remove(Key3(4, 4, 4));
        assert_eq!(m.len(), 2);
        assert!(!m.contains_key(Key3(1, 1, 1)));
        assert_treap(&m);
    }

    #[test]
    fn test_setting_zero_removes() {
        let m = PersistentMap::new().set(Key2(1, 1), 3).set(Key2(1, 1), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn test_old_versions_are_untouched() {
        let mut versions = vec![PersistentMap::new()];
        for i in 1..=50u32 {
            let next = versions.last().unwrap().set(Key2(i % 7, i), i);
            versions.push(next);
        }
        for (n, version) in versions.iter().enumerate() {
            assert_eq!(version.len(), n);
            for i in 1..=50u32 {
                let expected = if (i as usize) <= n { i } else { 0 };
                assert_eq!(version.get(Key2(i % 7, i)), expected);
            }
            assert_treap(version);
        }
    }

    #[test]
    fn test_clone_shares_structure() {
        let m: PersistentMap<Key2> = (1..20).map(|i| (Key2(i, i), i)).collect();
        let snapshot = m.clone();
        assert!(snapshot.ptr_eq(&m));
        let changed = m.set(Key2(3, 3), 100);
        assert!(!changed.ptr_eq(&m));
        assert_eq!(snapshot.get(Key2(3, 3)), 3);
    }

    #[test]
    fn test_shape_depends_only_on_contents() {
        let a = PersistentMap::new()
            .set(Key3(1, 1, 1), 1)
            .set(Key3(1, 1, 2), 2)
            .set(Key3(1, 1, 3), 3);
        let b = PersistentMap::new()
            .set(Key3(1, 1, 3), 3)
            .set(Key3(1, 1, 9), 9)
            .set(Key3(1, 1, 1), 1)
            .remove(Key3(1, 1, 9))
            .set(Key3(1, 1, 2), 2);
        assert_eq!(a, b);
        assert_eq!(a.root.as_ref().unwrap().key, b.root.as_ref().unwrap().key);
    }

    #[test]
    fn test_adjust_counter() {
        let m = PersistentMap::new().adjust(Key2(2, 3), 1).adjust(Key2(2, 3), 1);
        assert_eq!(m.get(Key2(2, 3)), 2);
        let m = m.adjust(Key2(2, 3), -2);
        assert!(m.is_empty());
    }

    #[test]
    fn test_bounds_over_last_component() {
        let m = PersistentMap::new()
            .set(Key3(1, 2, 4), 1)
            .set(Key3(1, 2, 6), 1)
            .set(Key3(1, 2, 2), 1)
            .set(Key3(1, 1, 7), 1)
            .set(Key3(1, 3, 1), 1)
            .set(Key3(2, 2, 5), 1);
        assert_eq!(m.bounds((1, 2)), Some((2, 6)));
        assert_eq!(m.bounds((1, 1)), Some((7, 7)));
        assert_eq!(m.bounds((2, 2)), Some((5, 5)));
        assert_eq!(m.bounds((1, 4)), None);
        assert_eq!(m.bounds((0, 0)), None);
        assert_eq!(PersistentMap::<Key3>::new().bounds((1, 1)), None);
    }

    #[test]
    fn test_iter_sorted() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut reference = BTreeMap::new();
        let mut m = PersistentMap::new();
        for _ in 0..300 {
            let key = Key3(
                rng.random_range(1..5),
                rng.random_range(1..7),
                rng.random_range(1..8),
            );
            let value = rng.random_range(0..4);
            m = m.set(key, value);
            if value == 0 {
                reference.remove(&key);
            } else {
                reference.insert(key, value);
            }
        }
        assert_treap(&m);
        let got: Vec<_> = m.iter().collect();
        let want: Vec<_> = reference.into_iter().collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_sample_covers_all_keys() {
        let m: PersistentMap<Key2> = (1..=10).map(|i| (Key2(1, i), i)).collect();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut hits: HashMap<Key2, usize> = HashMap::new();
        for _ in 0..10_000 {
            let (key, value) = m.sample(&mut rng).unwrap();
            assert_eq!(value, key.1);
            *hits.entry(key).or_default() += 1;
        }
        assert_eq!(hits.len(), 10);
        // roughly uniform: each key expected ~1000 times
        assert!(hits.values().all(|&h| (700..1300).contains(&h)));
        assert!(PersistentMap::<Key2>::new().sample(&mut rng).is_none());
    }
}
