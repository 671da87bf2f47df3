//! A map keyed by composite values through a canonical string encoding.
//!
//! The chart indexes classes by their degree vector. Keys are stored under their canonical
//! string form, and the original key is kept alongside the value for iteration.

use indexmap::IndexMap;

/// Canonical string encoding used as the lookup key.
pub trait StringifyingKey {
    fn stringify_key(&self) -> String;
}

impl StringifyingKey for [i32] {
    fn stringify_key(&self) -> String {
        let mut out = String::with_capacity(self.len() * 3);
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&v.to_string());
        }
        out
    }
}

impl StringifyingKey for Vec<i32> {
    fn stringify_key(&self) -> String {
        self.as_slice().stringify_key()
    }
}

impl StringifyingKey for str {
    fn stringify_key(&self) -> String {
        self.to_string()
    }
}

impl StringifyingKey for String {
    fn stringify_key(&self) -> String {
        self.clone()
    }
}

#[derive(Debug, Clone)]
pub struct StringifyingMap<K, V> {
    entries: IndexMap<String, (K, V)>,
}

impl<K, V> Default for StringifyingMap<K, V> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<K: StringifyingKey, V> StringifyingMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key<Q: StringifyingKey + ?Sized>(&self, key: &Q) -> bool {
        self.entries.contains_key(&key.stringify_key())
    }

    pub fn get<Q: StringifyingKey + ?Sized>(&self, key: &Q) -> Option<&V> {
        self.entries.get(&key.stringify_key()).map(|(_, v)| v)
    }

    pub fn get_mut<Q: StringifyingKey + ?Sized>(&mut self, key: &Q) -> Option<&mut V> {
        self.entries.get_mut(&key.stringify_key()).map(|(_, v)| v)
    }

    /// Inserts `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let key_string = key.stringify_key();
        self.entries
            .insert(key_string, (key, value))
            .map(|(_, old)| old)
    }

    pub fn get_or_insert_with(&mut self, key: K, f: impl FnOnce() -> V) -> &mut V {
        let key_string = key.stringify_key();
        &mut self.entries.entry(key_string).or_insert_with(|| (key, f())).1
    }

    pub fn remove<Q: StringifyingKey + ?Sized>(&mut self, key: &Q) -> Option<V> {
        self.entries
            .shift_remove(&key.stringify_key())
            .map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.values().map(|(k, _)| k)
    }
}
