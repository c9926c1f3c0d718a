//! Bounded selection of the largest files seen in a stream.

use crate::walker::FileEntry;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::num::NonZeroUsize;

/// Heap slot ordered by size, then by arrival; paths never take part in
/// comparisons.
///
/// Among equal sizes the later arrival compares smaller, so it is the one
/// sitting at the min-heap root and evicted first.
#[derive(Debug)]
struct Slot {
    entry: FileEntry,
    seq: u64,
}

impl Slot {
    fn key(&self) -> (u64, Reverse<u64>) {
        (self.entry.size, Reverse(self.seq))
    }
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Slot {}

impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Keeps the `capacity` largest entries offered so far.
///
/// Backed by a min-heap, so the smallest kept entry is always at the root.
/// When full, an incoming entry replaces the minimum only if it is strictly
/// larger, evicting the most recently offered of the smallest kept entries.
/// Ties at the boundary therefore go to the entry seen first.
#[derive(Debug)]
pub struct TopNSelector {
    capacity: NonZeroUsize,
    heap: BinaryHeap<Reverse<Slot>>,
    offered: u64,
}

impl TopNSelector {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.get()),
            offered: 0,
        }
    }

    /// Offers an entry. Returns true if it was kept.
    pub fn offer(&mut self, entry: FileEntry) -> bool {
        let slot = Slot {
            entry,
            seq: self.offered,
        };
        self.offered += 1;

        if self.heap.len() < self.capacity.get() {
            self.heap.push(Reverse(slot));
            return true;
        }

        match self.heap.peek_mut() {
            Some(mut min) if slot.entry.size > min.0.entry.size => {
                *min = Reverse(slot);
                true
            }
            _ => false,
        }
    }

    /// Size of the smallest entry currently kept.
    pub fn min_size(&self) -> Option<u64> {
        self.heap.peek().map(|min| min.0.entry.size)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Consumes the selector and returns the kept entries in no particular
    /// order.
    pub fn results(self) -> Vec<FileEntry> {
        self.heap
            .into_vec()
            .into_iter()
            .map(|Reverse(slot)| slot.entry)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(capacity: usize) -> TopNSelector {
        TopNSelector::new(NonZeroUsize::new(capacity).unwrap())
    }

    fn names(entries: Vec<FileEntry>) -> Vec<String> {
        entries
            .into_iter()
            .map(|entry| entry.path.to_string_lossy().to_string())
            .collect()
    }

    fn sorted_sizes(entries: &[FileEntry]) -> Vec<u64> {
        let mut sizes: Vec<u64> = entries.iter().map(|entry| entry.size).collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes
    }

    #[test]
    fn test_keeps_everything_below_capacity() {
        let mut top = selector(5);
        assert!(top.offer(FileEntry::new("a", 3)));
        assert!(top.offer(FileEntry::new("b", 1)));
        assert_eq!(top.len(), 2);
        assert_eq!(top.min_size(), Some(1));
        assert_eq!(sorted_sizes(&top.results()), vec![3, 1]);
    }

    #[test]
    fn test_keeps_largest() {
        let mut top = selector(2);
        for (name, size) in [("a", 10), ("b", 50), ("c", 5), ("d", 100)] {
            top.offer(FileEntry::new(name, size));
        }

        let mut results = top.results();
        results.sort_by(|a, b| b.size.cmp(&a.size));
        assert_eq!(
            results,
            vec![FileEntry::new("d", 100), FileEntry::new("b", 50)]
        );
    }

    #[test]
    fn test_existing_entries_win_ties() {
        let mut top = selector(3);
        assert!(top.offer(FileEntry::new("first", 5)));
        assert!(top.offer(FileEntry::new("second", 5)));
        assert!(top.offer(FileEntry::new("third", 5)));
        assert!(!top.offer(FileEntry::new("fourth", 5)));

        let mut names = names(top.results());
        names.sort();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_eviction_drops_latest_of_equal_minimums() {
        let mut top = selector(2);
        assert!(top.offer(FileEntry::new("a", 5)));
        assert!(top.offer(FileEntry::new("b", 5)));
        assert!(top.offer(FileEntry::new("c", 10)));

        let mut names = names(top.results());
        names.sort();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_first_seen_survives_repeated_evictions() {
        let mut top = selector(3);
        for name in ["p", "q", "r", "s"] {
            top.offer(FileEntry::new(name, 1));
        }
        top.offer(FileEntry::new("big", 9));
        top.offer(FileEntry::new("bigger", 10));

        let mut names = names(top.results());
        names.sort();
        assert_eq!(names, vec!["big", "bigger", "p"]);
    }

    #[test]
    fn test_smaller_entry_rejected_when_full() {
        let mut top = selector(1);
        assert!(top.offer(FileEntry::new("big", 10)));
        assert!(!top.offer(FileEntry::new("small", 9)));
        assert!(top.offer(FileEntry::new("bigger", 11)));
        assert_eq!(top.results(), vec![FileEntry::new("bigger", 11)]);
    }

    #[test]
    fn test_matches_full_sort_over_a_stream() {
        let sizes: Vec<u64> = (0..200u64).map(|i| (i * 7919) % 1009).collect();
        for capacity in [1usize, 3, 10, 199, 200, 250] {
            let mut top = selector(capacity);
            for (i, size) in sizes.iter().enumerate() {
                top.offer(FileEntry::new(format!("f{}", i), *size));
                assert!(top.len() <= capacity);
            }

            let mut expected = sizes.clone();
            expected.sort_unstable_by(|a, b| b.cmp(a));
            expected.truncate(capacity.min(sizes.len()));

            assert_eq!(sorted_sizes(&top.results()), expected, "capacity {}", capacity);
        }
    }
}
