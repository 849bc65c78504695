//! Bidirectional intern table: values to dense indices and back.

use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Index;

/// End of a bucket chain.
const NIL: usize = usize::MAX;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    next: usize,
}

/// Chained hash table handing out indices `0, 1, 2, ...` in insertion order.
///
/// Values are never removed, so an index stays valid for the lifetime of the table.
#[derive(Debug, Clone)]
pub struct InternTable<T> {
    data: Vec<Entry<T>>,
    buckets: Vec<usize>,
    bitmask: u64,
}

impl<T> Default for InternTable<T> {
    fn default() -> Self {
        Self::new(4)
    }
}

impl<T> InternTable<T> {
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bucket bits should be in the range 0..=31");
        let size = 1 << bits;
        Self {
            data: Vec::new(),
            buckets: vec![NIL; size],
            bitmask: (size - 1) as u64,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `index`, or `None` if the index was never handed out.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.data.get(index).map(|e| &e.value)
    }

    /// Values in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter().map(|e| &e.value)
    }
}

fn hash_of<Q: Hash + ?Sized>(value: &Q) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl<T> InternTable<T>
where
    T: Hash + Eq,
{
    fn bucket_index<Q: Hash + ?Sized>(&self, value: &Q) -> usize {
        (hash_of(value) & self.bitmask) as usize
    }

    /// Index of `value`, if present.
    pub fn find<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut index = self.buckets[self.bucket_index(value)];
        while index != NIL {
            let entry = &self.data[index];
            if entry.value.borrow() == value {
                return Some(index);
            }
            index = entry.next;
        }
        None
    }

    /// Put `value` into the table and return its index; an equal value keeps its old index.
    pub fn put(&mut self, value: T) -> usize {
        if let Some(index) = self.find(&value) {
            return index;
        }
        if self.data.len() >= 2 * self.buckets.len() {
            self.grow();
        }

        let bucket = self.bucket_index(&value);
        let index = self.data.len();
        self.data.push(Entry {
            value,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = index;
        index
    }

    /// Doubles the number of buckets and rechains all entries.
    fn grow(&mut self) {
        let size = 2 * self.buckets.len();
        self.buckets = vec![NIL; size];
        self.bitmask = (size - 1) as u64;
        for index in 0..self.data.len() {
            let bucket = self.bucket_index(&self.data[index].value);
            self.data[index].next = self.buckets[bucket];
            self.buckets[bucket] = index;
        }
    }
}

impl<T> Index<usize> for InternTable<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index].value
    }
}
