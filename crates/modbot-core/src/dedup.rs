//! Bounded recency cache that collapses duplicate notification deliveries.

use std::collections::HashSet;

pub const DEFAULT_DEDUP_CAPACITY: usize = 200;

/// Capacity-bounded set of recently seen event identifiers with
/// least-recently-used eviction. A lookup through [`DedupCache::has`] counts
/// as a use and protects the entry from eviction ahead of untouched ones.
///
/// Entries have no TTL; their lifetime ends by eviction or an explicit
/// [`DedupCache::clear`].
#[derive(Debug)]
pub struct DedupCache {
    cap: usize,
    // Front is least recently used.
    order: Vec<u64>,
    index: HashSet<u64>,
}

impl DedupCache {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            order: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Returns whether the identifier was seen recently, touching it so the
    /// entry becomes the most recently used one.
    pub fn has(&mut self, event_id: u64) -> bool {
        if !self.index.contains(&event_id) {
            return false;
        }
        self.touch(event_id);
        true
    }

    pub fn mark_seen(&mut self, event_id: u64) {
        if self.index.contains(&event_id) {
            self.touch(event_id);
            return;
        }
        self.order.push(event_id);
        self.index.insert(event_id);
        while self.order.len() > self.cap {
            let evicted = self.order.remove(0);
            self.index.remove(&evicted);
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    fn touch(&mut self, event_id: u64) {
        if let Some(position) = self.order.iter().position(|seen| *seen == event_id) {
            let seen = self.order.remove(position);
            self.order.push(seen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_detect_duplicate() {
        let mut cache = DedupCache::new(8);
        assert!(!cache.has(1));
        cache.mark_seen(1);
        assert!(cache.has(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut cache = DedupCache::new(8);
        cache.mark_seen(1);
        cache.mark_seen(2);
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.has(1));
        assert!(!cache.has(2));
    }

    #[test]
    fn eviction_drops_least_recently_used_past_capacity() {
        let mut cache = DedupCache::new(3);
        cache.mark_seen(1);
        cache.mark_seen(2);
        cache.mark_seen(3);
        cache.mark_seen(4);
        assert!(!cache.has(1));
        assert!(cache.has(2));
        assert!(cache.has(3));
        assert!(cache.has(4));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn lookup_touch_protects_entry_from_eviction() {
        let mut cache = DedupCache::new(3);
        cache.mark_seen(1);
        cache.mark_seen(2);
        cache.mark_seen(3);
        // Touch the oldest entry; the untouched 2 must be evicted instead.
        assert!(cache.has(1));
        cache.mark_seen(4);
        assert!(cache.has(1));
        assert!(!cache.has(2));
        assert!(cache.has(3));
        assert!(cache.has(4));
    }

    #[test]
    fn re_marking_an_entry_only_touches_it() {
        let mut cache = DedupCache::new(2);
        cache.mark_seen(1);
        cache.mark_seen(2);
        cache.mark_seen(1);
        assert_eq!(cache.len(), 2);
        cache.mark_seen(3);
        assert!(cache.has(1));
        assert!(!cache.has(2));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut cache = DedupCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.mark_seen(1);
        cache.mark_seen(2);
        assert_eq!(cache.len(), 1);
        assert!(!cache.has(1));
        assert!(cache.has(2));
    }
}
