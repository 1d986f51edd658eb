//! An insertion-order-preserving map used where §4.2 requires iteration
//! order to be "insertion order, preserved in state" (the `proposals` map)
//! rather than key order.

use indexmap::IndexMap;
use parity_scale_codec::{Decode, Encode, Error as CodecError, Input, Output};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedMap<K: Hash + Eq, V>(IndexMap<K, V>);

impl<K: Hash + Eq, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        OrderedMap(IndexMap::new())
    }
}

impl<K: Hash + Eq, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> indexmap::map::IterMut<'_, K, V> {
        self.0.iter_mut()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Hash + Eq + Encode, V: Encode> Encode for OrderedMap<K, V> {
    fn encode_to<T: Output + ?Sized>(&self, dest: &mut T) {
        let pairs: Vec<(&K, &V)> = self.0.iter().collect();
        pairs.encode_to(dest);
    }
}

impl<K: Hash + Eq + Decode, V: Decode> Decode for OrderedMap<K, V> {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let pairs = Vec::<(K, V)>::decode(input)?;
        let mut map = IndexMap::with_capacity(pairs.len());
        for (k, v) in pairs {
            map.insert(k, v);
        }
        Ok(OrderedMap(map))
    }
}

impl<K: Hash + Eq, V> IntoIterator for OrderedMap<K, V> {
    type Item = (K, V);
    type IntoIter = indexmap::map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, K: Hash + Eq, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = indexmap::map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
