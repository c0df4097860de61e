//! Insertion-ordered name table
//!
//! Members of a class are kept in declaration order so that consumers walking
//! a metaclass (serializers, editors) see them the way they were declared.
//! Each key appears at most once: inserting an existing key removes the old
//! entry and appends the new one.

use std::borrow::Borrow;

/// Ordered `key -> value` table with one entry per key
#[derive(Debug, Clone)]
pub struct NameTable<K, V> {
    entries: Vec<(K, V)>,
}

impl<K, V> Default for NameTable<K, V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq, V> NameTable<K, V> {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of the entry whose key equals `key`
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.entries.iter().position(|(k, _)| k.borrow() == key)
    }

    /// Value stored under `key`
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.find(key).map(|i| &self.entries[i].1)
    }

    /// Mutable value stored under `key`
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self.find(key) {
            Some(index) => Some(&mut self.entries[index].1),
            None => None,
        }
    }

    /// Entry at position `index` in insertion order
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(k, v)| (k, v))
    }

    /// Whether an entry exists for `key`
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Insert `value` under `key`, removing any previous entry for that key.
    ///
    /// The new entry goes to the end of the table. Returns the replaced value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.erase(&key);
        self.entries.push((key, value));
        previous
    }

    /// Copy an entry taken from another table
    pub fn insert_entry(&mut self, entry: (&K, &V)) -> Option<V>
    where
        K: Clone,
        V: Clone,
    {
        self.insert(entry.0.clone(), entry.1.clone())
    }

    /// Remove the entry for `key`. Missing keys are ignored.
    pub fn erase<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        let index = self.find(key)?;
        Some(self.entries.remove(index).1)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }
}
