//! Fully associative translation lookaside buffer.
//!
//! Recency is tracked with a per-entry LRU counter instead of a linked list:
//! the most recently used entry holds `capacity - 1`, the least recently used
//! holds 0. Counters start as `0, 1, .., capacity - 1` so they always form a
//! permutation, and misses fill empty slots in index order before evicting.

use crate::constants::DEFAULT_TLB_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    lru_value: usize,
    /// `None` until the slot is first filled
    key: Option<u32>,
    frame: i32,
}

#[derive(Debug, Clone)]
pub struct TranslationLookasideBuffer {
    cache: Box<[Entry]>,
}

impl TranslationLookasideBuffer {
    /// Create an empty TLB. A zero capacity is raised to one entry.
    pub fn new(capacity: usize) -> Self {
        let cache = (0..capacity.max(1))
            .map(|lru_value| Entry { lru_value, key: None, frame: 0 })
            .collect();
        TranslationLookasideBuffer { cache }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cache.len()
    }

    #[inline]
    pub fn max_lru_value(&self) -> usize {
        self.capacity() - 1
    }

    /// Index of the entry caching `key`
    pub fn hit_index(&self, key: u32) -> Option<usize> {
        self.cache.iter().position(|entry| entry.key == Some(key))
    }

    /// Promote the entry at `index` to most recently used and return its frame
    pub fn do_hit(&mut self, key: u32, index: usize) -> i32 {
        debug_assert_eq!(self.cache[index].key, Some(key));

        let previous = self.cache[index].lru_value;
        for entry in self.cache.iter_mut() {
            if entry.lru_value > previous {
                entry.lru_value -= 1;
            }
        }

        let max = self.max_lru_value();
        let hit = &mut self.cache[index];
        hit.lru_value = max;
        hit.frame
    }

    /// Replace the least recently used entry with `(key, frame)`
    pub fn do_miss(&mut self, key: u32, frame: i32) {
        let max = self.max_lru_value();
        for entry in self.cache.iter_mut() {
            if entry.lru_value == 0 {
                *entry = Entry { lru_value: max, key: Some(key), frame };
            } else {
                entry.lru_value -= 1;
            }
        }
    }

    /// Current LRU counters in slot order
    pub fn lru_values(&self) -> Vec<usize> {
        self.cache.iter().map(|entry| entry.lru_value).collect()
    }
}

impl Default for TranslationLookasideBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TLB_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_permutation(tlb: &TranslationLookasideBuffer) {
        let mut values = tlb.lru_values();
        values.sort_unstable();
        let expected: Vec<usize> = (0..tlb.capacity()).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_empty_tlb_misses() {
        let tlb = TranslationLookasideBuffer::default();
        assert_eq!(tlb.capacity(), 4);
        assert_eq!(tlb.max_lru_value(), 3);
        assert_eq!(tlb.hit_index(0), None);
    }

    #[test]
    fn test_two_entry_scenario() {
        let mut tlb = TranslationLookasideBuffer::new(2);
        tlb.do_miss(10, 100);
        tlb.do_miss(20, 200);

        assert_eq!(tlb.hit_index(10), Some(0));
        assert_eq!(tlb.hit_index(20), Some(1));

        assert_eq!(tlb.do_hit(10, 0), 100);
        // 10 is now most recent, so the next miss evicts 20
        assert_eq!(tlb.lru_values(), vec![1, 0]);
        tlb.do_miss(30, 300);
        assert_eq!(tlb.hit_index(20), None);
        assert_eq!(tlb.hit_index(10), Some(0));
        assert_eq!(tlb.hit_index(30), Some(1));
    }

    #[test]
    fn test_misses_fill_slots_in_order() {
        let mut tlb = TranslationLookasideBuffer::new(4);
        for key in 0..4 {
            tlb.do_miss(key, key as i32 * 512);
        }
        for key in 0..4 {
            assert_eq!(tlb.hit_index(key), Some(key as usize));
        }
        assert_eq!(tlb.lru_values(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut tlb = TranslationLookasideBuffer::new(3);
        tlb.do_miss(1, 10);
        tlb.do_miss(2, 20);
        tlb.do_miss(3, 30);

        // Touch 1, making 2 the least recently used
        let index = tlb.hit_index(1).unwrap();
        tlb.do_hit(1, index);

        tlb.do_miss(4, 40);
        assert_eq!(tlb.hit_index(2), None);
        assert!(tlb.hit_index(1).is_some());
        assert!(tlb.hit_index(3).is_some());
        assert!(tlb.hit_index(4).is_some());
    }

    #[test]
    fn test_hit_on_most_recent_is_stable() {
        let mut tlb = TranslationLookasideBuffer::new(4);
        tlb.do_miss(7, 70);
        let before = tlb.lru_values();
        let index = tlb.hit_index(7).unwrap();
        assert_eq!(tlb.do_hit(7, index), 70);
        assert_eq!(tlb.lru_values(), before);
    }

    #[test]
    fn test_lru_values_stay_a_permutation() {
        let mut tlb = TranslationLookasideBuffer::new(4);
        assert_permutation(&tlb);

        // Deterministic mix of hits and misses over a small key space
        let mut key = 1u32;
        for step in 0..200u32 {
            key = (key * 7 + step) % 11;
            match tlb.hit_index(key) {
                Some(index) => {
                    tlb.do_hit(key, index);
                }
                None => tlb.do_miss(key, key as i32),
            }
            assert_permutation(&tlb);
        }
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut tlb = TranslationLookasideBuffer::new(0);
        assert_eq!(tlb.capacity(), 1);
        tlb.do_miss(5, 50);
        tlb.do_miss(6, 60);
        assert_eq!(tlb.hit_index(5), None);
        assert_eq!(tlb.hit_index(6), Some(0));
    }
}
