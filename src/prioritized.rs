//! Ordered collection draining items by descending priority.
use std::cmp::Reverse;

struct Entry<T> {
    priority: i32,
    seq: u64,
    item: T,
}

/// List of items ordered by descending priority; items with equal priority
/// come out in the order they were added.
///
/// Used for the deferred-validation queue and usable for any one-shot ordered
/// dispatch. Items are kept unordered until iteration, so adding is O(1).
pub struct PrioritizedList<T> {
    entries: Vec<Entry<T>>,
}

impl<T> PrioritizedList<T> {
    pub fn new() -> Self {
        PrioritizedList {
            entries: Vec::new(),
        }
    }

    /// Add `item` with the given priority (higher runs first).
    pub fn add(&mut self, item: T, priority: i32) {
        let seq = self.entries.len() as u64;
        self.entries.push(Entry {
            priority,
            seq,
            item,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for PrioritizedList<T> {
    fn default() -> Self {
        PrioritizedList::new()
    }
}

impl<T> IntoIterator for PrioritizedList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.entries
            .sort_by_key(|entry| (Reverse(entry.priority), entry.seq));
        self.entries
            .into_iter()
            .map(|entry| entry.item)
            .collect::<Vec<T>>()
            .into_iter()
    }
}
