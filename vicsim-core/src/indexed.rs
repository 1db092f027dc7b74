//! Dense and sparse containers keyed by registered entities.
//!
//! Registration hands every entity a small dense index; wherever a value
//! must exist for every member of a set (one price per good, one weight per
//! ideology) an [`IndexedMap`] holds exactly `|K|` slots. [`FixedMap`] is
//! the sparse, insertion-ordered companion for maps that only name a few
//! keys (recipe inputs, issue support).

use crate::fixed::Fixed;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::marker::PhantomData;

/// A typed dense index, assigned at registration, contiguous from 0.
pub trait EntityIndex: Copy + Eq + Hash {
    fn from_usize(raw: usize) -> Self;
    fn as_usize(self) -> usize;
}

/// Declares a typed index newtype. Keeps good indices from being confused
/// with ideology indices at compile time.
#[macro_export]
macro_rules! define_index {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub u32);

        impl $crate::indexed::EntityIndex for $name {
            #[inline]
            fn from_usize(raw: usize) -> Self {
                $name(raw as u32)
            }

            #[inline]
            fn as_usize(self) -> usize {
                self.0 as usize
            }
        }
    };
}

/// Dense array with one `V` per registered `K`.
///
/// Iteration order is registration order. Element-wise arithmetic is
/// defined against maps over the same key set and against scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "V: Serialize", deserialize = "V: Deserialize<'de>"))]
pub struct IndexedMap<K, V> {
    values: Vec<V>,
    #[serde(skip)]
    _key: PhantomData<K>,
}

impl<K: EntityIndex, V: Clone + Default> IndexedMap<K, V> {
    /// One default slot per registered key.
    pub fn new(key_count: usize) -> Self {
        Self {
            values: vec![V::default(); key_count],
            _key: PhantomData,
        }
    }

    /// Reset every slot to the default value.
    pub fn clear(&mut self) {
        self.values.fill(V::default());
    }
}

impl<K: EntityIndex, V> IndexedMap<K, V> {
    pub fn from_fn(key_count: usize, mut f: impl FnMut(K) -> V) -> Self {
        Self {
            values: (0..key_count).map(|i| f(K::from_usize(i))).collect(),
            _key: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: K) -> Option<&V> {
        self.values.get(key.as_usize())
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.values.get_mut(key.as_usize())
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.values
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (K::from_usize(i), v))
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }
}

impl<K: EntityIndex, V: Clone> IndexedMap<K, V> {
    pub fn fill(&mut self, value: V) {
        self.values.fill(value);
    }
}

impl<K: EntityIndex, V> std::ops::Index<K> for IndexedMap<K, V> {
    type Output = V;
    fn index(&self, key: K) -> &V {
        &self.values[key.as_usize()]
    }
}

impl<K: EntityIndex, V> std::ops::IndexMut<K> for IndexedMap<K, V> {
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.values[key.as_usize()]
    }
}

impl<K: EntityIndex, V: Copy + std::ops::AddAssign> std::ops::AddAssign<&IndexedMap<K, V>>
    for IndexedMap<K, V>
{
    fn add_assign(&mut self, rhs: &IndexedMap<K, V>) {
        debug_assert_eq!(self.values.len(), rhs.values.len());
        for (lhs, rhs) in self.values.iter_mut().zip(rhs.values.iter()) {
            *lhs += *rhs;
        }
    }
}

impl<K: EntityIndex, V: Copy + std::ops::SubAssign> std::ops::SubAssign<&IndexedMap<K, V>>
    for IndexedMap<K, V>
{
    fn sub_assign(&mut self, rhs: &IndexedMap<K, V>) {
        debug_assert_eq!(self.values.len(), rhs.values.len());
        for (lhs, rhs) in self.values.iter_mut().zip(rhs.values.iter()) {
            *lhs -= *rhs;
        }
    }
}

impl<K: EntityIndex> std::ops::MulAssign<Fixed> for IndexedMap<K, Fixed> {
    fn mul_assign(&mut self, rhs: Fixed) {
        for v in &mut self.values {
            *v *= rhs;
        }
    }
}

impl<K: EntityIndex> std::ops::DivAssign<Fixed> for IndexedMap<K, Fixed> {
    fn div_assign(&mut self, rhs: Fixed) {
        for v in &mut self.values {
            *v /= rhs;
        }
    }
}

impl<K: EntityIndex> IndexedMap<K, Fixed> {
    pub fn total(&self) -> Fixed {
        self.values.iter().copied().sum()
    }

    /// Scale every element so the total becomes `target`. No-op when the
    /// current total is zero (there is nothing to apportion by).
    pub fn normalise_to(&mut self, target: Fixed) {
        let total = self.total();
        if total == Fixed::ZERO {
            return;
        }
        for v in &mut self.values {
            *v = v.mul_div(target, total);
        }
    }

    /// Re-anchor a share distribution whose sum has drifted (pop ideology
    /// and issue maps are rescaled to pop size after updates).
    pub fn rescale(&mut self, target: Fixed) {
        self.normalise_to(target);
    }
}

/// Sparse fixed-point map preserving insertion order.
///
/// Realised as an entry vector plus a key → slot lookup, which keeps
/// iteration deterministic while lookups stay O(1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    bound(
        serialize = "K: Serialize + Clone",
        deserialize = "K: Deserialize<'de> + Copy + Eq + Hash"
    ),
    from = "Vec<(K, Fixed)>",
    into = "Vec<(K, Fixed)>"
)]
pub struct FixedMap<K: Copy + Eq + Hash> {
    entries: Vec<(K, Fixed)>,
    slots: FxHashMap<K, usize>,
}

impl<K: Copy + Eq + Hash> Default for FixedMap<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            slots: FxHashMap::default(),
        }
    }
}

impl<K: Copy + Eq + Hash> FixedMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.slots.contains_key(&key)
    }

    /// Value for `key`, zero when absent.
    pub fn get(&self, key: K) -> Fixed {
        self.slots
            .get(&key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(Fixed::ZERO)
    }

    pub fn lookup(&self, key: K) -> Option<Fixed> {
        self.slots.get(&key).map(|&slot| self.entries[slot].1)
    }

    /// Insert or overwrite.
    pub fn set(&mut self, key: K, value: Fixed) {
        match self.slots.get(&key) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.slots.insert(key, self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Add to the entry, inserting it first if absent.
    pub fn add(&mut self, key: K, value: Fixed) {
        match self.slots.get(&key) {
            Some(&slot) => self.entries[slot].1 += value,
            None => {
                self.slots.insert(key, self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, Fixed)> + '_ {
        self.entries.iter().copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn total(&self) -> Fixed {
        self.entries.iter().map(|(_, v)| *v).sum()
    }

    /// Entry with the largest value, first-inserted wins ties.
    pub fn largest(&self) -> Option<(K, Fixed)> {
        let mut best: Option<(K, Fixed)> = None;
        for &(key, value) in &self.entries {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((key, value)),
            }
        }
        best
    }

    /// Entry with the largest value; when two values are equal the key
    /// predicate decides whether the candidate replaces the incumbent.
    pub fn largest_by(&self, tie_break: impl Fn(&K, &K) -> bool) -> Option<(K, Fixed)> {
        let mut best: Option<(K, Fixed)> = None;
        for &(key, value) in &self.entries {
            best = match best {
                None => Some((key, value)),
                Some((best_key, best_value)) => {
                    if value > best_value || (value == best_value && tie_break(&key, &best_key)) {
                        Some((key, value))
                    } else {
                        Some((best_key, best_value))
                    }
                }
            };
        }
        best
    }

    /// Largest and second-largest entries in a single pass.
    pub fn largest_two(&self) -> (Option<(K, Fixed)>, Option<(K, Fixed)>) {
        let mut first: Option<(K, Fixed)> = None;
        let mut second: Option<(K, Fixed)> = None;
        for &(key, value) in &self.entries {
            if first.map_or(true, |(_, v)| value > v) {
                second = first;
                first = Some((key, value));
            } else if second.map_or(true, |(_, v)| value > v) {
                second = Some((key, value));
            }
        }
        (first, second)
    }

    /// Scale every entry so the total becomes `target`; no-op on zero total.
    pub fn rescale(&mut self, target: Fixed) {
        let total = self.total();
        if total == Fixed::ZERO {
            return;
        }
        for (_, v) in &mut self.entries {
            *v = v.mul_div(target, total);
        }
    }
}

impl<K: Copy + Eq + Hash> std::ops::AddAssign<&FixedMap<K>> for FixedMap<K> {
    fn add_assign(&mut self, rhs: &FixedMap<K>) {
        for (key, value) in rhs.iter() {
            self.add(key, value);
        }
    }
}

impl<K: Copy + Eq + Hash> std::ops::SubAssign<&FixedMap<K>> for FixedMap<K> {
    fn sub_assign(&mut self, rhs: &FixedMap<K>) {
        for (key, value) in rhs.iter() {
            self.add(key, -value);
        }
    }
}

impl<K: Copy + Eq + Hash> std::ops::MulAssign<Fixed> for FixedMap<K> {
    fn mul_assign(&mut self, rhs: Fixed) {
        for (_, v) in &mut self.entries {
            *v *= rhs;
        }
    }
}

impl<K: Copy + Eq + Hash> std::ops::DivAssign<Fixed> for FixedMap<K> {
    fn div_assign(&mut self, rhs: Fixed) {
        for (_, v) in &mut self.entries {
            *v /= rhs;
        }
    }
}

impl<K: Copy + Eq + Hash> From<Vec<(K, Fixed)>> for FixedMap<K> {
    fn from(entries: Vec<(K, Fixed)>) -> Self {
        let mut map = FixedMap::new();
        for (key, value) in entries {
            map.set(key, value);
        }
        map
    }
}

impl<K: Copy + Eq + Hash> From<FixedMap<K>> for Vec<(K, Fixed)> {
    fn from(map: FixedMap<K>) -> Self {
        map.entries
    }
}

impl<K: Copy + Eq + Hash> FromIterator<(K, Fixed)> for FixedMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, Fixed)>>(iter: I) -> Self {
        let mut map = FixedMap::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    define_index!(TestIndex);

    fn fx(v: i64) -> Fixed {
        Fixed::from_int(v)
    }

    #[test]
    fn indexed_map_dense_access() {
        let mut map: IndexedMap<TestIndex, Fixed> = IndexedMap::new(3);
        map[TestIndex(1)] = fx(5);
        assert_eq!(map[TestIndex(0)], Fixed::ZERO);
        assert_eq!(map[TestIndex(1)], fx(5));
        assert_eq!(map.len(), 3);
        assert_eq!(map.total(), fx(5));
    }

    #[test]
    fn indexed_map_elementwise_ops() {
        let mut a: IndexedMap<TestIndex, Fixed> = IndexedMap::new(2);
        let mut b: IndexedMap<TestIndex, Fixed> = IndexedMap::new(2);
        a[TestIndex(0)] = fx(1);
        a[TestIndex(1)] = fx(2);
        b[TestIndex(0)] = fx(10);
        b[TestIndex(1)] = fx(20);
        a += &b;
        assert_eq!(a[TestIndex(0)], fx(11));
        assert_eq!(a[TestIndex(1)], fx(22));
        a *= fx(2);
        assert_eq!(a.total(), fx(66));
        a -= &b;
        assert_eq!(a[TestIndex(0)], fx(12));
    }

    #[test]
    fn indexed_map_normalise() {
        let mut map: IndexedMap<TestIndex, Fixed> = IndexedMap::new(3);
        map[TestIndex(0)] = fx(1);
        map[TestIndex(1)] = fx(1);
        map[TestIndex(2)] = fx(2);
        map.normalise_to(fx(1000));
        assert_eq!(map[TestIndex(0)], fx(250));
        assert_eq!(map[TestIndex(2)], fx(500));
        assert_eq!(map.total(), fx(1000));
    }

    #[test]
    fn fixed_map_preserves_insertion_order() {
        let mut map: FixedMap<u32> = FixedMap::new();
        map.set(7, fx(1));
        map.set(3, fx(2));
        map.set(9, fx(3));
        map.set(3, fx(4)); // overwrite keeps the original position
        let keys: Vec<u32> = map.keys().collect();
        assert_eq!(keys, vec![7, 3, 9]);
        assert_eq!(map.get(3), fx(4));
        assert_eq!(map.get(100), Fixed::ZERO);
    }

    #[test]
    fn fixed_map_largest_queries() {
        let mut map: FixedMap<u32> = FixedMap::new();
        map.set(1, fx(5));
        map.set(2, fx(9));
        map.set(3, fx(9));
        map.set(4, fx(2));

        // First-inserted wins a plain tie
        assert_eq!(map.largest(), Some((2, fx(9))));
        // The predicate can prefer the higher key instead
        assert_eq!(map.largest_by(|a, b| a > b), Some((3, fx(9))));

        let (first, second) = map.largest_two();
        assert_eq!(first, Some((2, fx(9))));
        assert_eq!(second, Some((3, fx(9))));
    }

    #[test]
    fn fixed_map_largest_two_on_small_maps() {
        let mut map: FixedMap<u32> = FixedMap::new();
        assert_eq!(map.largest_two(), (None, None));
        map.set(1, fx(4));
        assert_eq!(map.largest_two(), (Some((1, fx(4))), None));
    }

    #[test]
    fn fixed_map_arithmetic_and_rescale() {
        let mut a: FixedMap<u32> = FixedMap::new();
        a.set(1, fx(2));
        a.set(2, fx(6));
        let mut b: FixedMap<u32> = FixedMap::new();
        b.set(2, fx(2));
        b.set(3, fx(1));
        a += &b;
        assert_eq!(a.get(2), fx(8));
        assert_eq!(a.get(3), fx(1));
        a *= fx(2);
        assert_eq!(a.total(), fx(22));
        a.rescale(fx(11));
        assert_eq!(a.total(), fx(11));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// (V1 + V2).total() == V1.total() + V2.total()
            #[test]
            fn addition_preserves_totals(
                lhs in proptest::collection::vec(-1_000_000i64..=1_000_000, 4),
                rhs in proptest::collection::vec(-1_000_000i64..=1_000_000, 4),
            ) {
                let mut a: IndexedMap<TestIndex, Fixed> = IndexedMap::new(4);
                let mut b: IndexedMap<TestIndex, Fixed> = IndexedMap::new(4);
                for i in 0..4 {
                    a[TestIndex(i as u32)] = Fixed::from_int(lhs[i]);
                    b[TestIndex(i as u32)] = Fixed::from_int(rhs[i]);
                }
                let expected = a.total() + b.total();
                a += &b;
                prop_assert_eq!(a.total(), expected);
            }

            /// normalise_to(s) lands within one epsilon per element of s
            #[test]
            fn normalise_hits_target(
                values in proptest::collection::vec(1i64..=1_000_000, 1..8),
                target in 1i64..=100_000,
            ) {
                let mut map: IndexedMap<TestIndex, Fixed> = IndexedMap::new(values.len());
                for (i, v) in values.iter().enumerate() {
                    map[TestIndex(i as u32)] = Fixed::from_int(*v);
                }
                let target = Fixed::from_int(target);
                map.normalise_to(target);
                let error = (map.total() - target).abs();
                prop_assert!(error.raw() <= values.len() as i64);
            }
        }
    }
}
