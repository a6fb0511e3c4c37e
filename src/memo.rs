use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::debug;

use crate::frame::Fingerprint;

/// Fingerprints of frames known to lead nowhere.
///
/// Bounded; once full, the least recently touched quarter of the entries is dropped in one go.
pub struct Memo {
    table: LruCache<Fingerprint, ()>,
}

impl Memo {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { table: LruCache::new(capacity) }
    }

    /// Whether `fingerprint` is known dead. A hit refreshes the entry.
    pub fn contains(&mut self, fingerprint: &Fingerprint) -> bool {
        self.table.get(fingerprint).is_some()
    }

    /// Record `fingerprint` as dead, returning how many older entries were evicted to make room.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> usize {
        let mut evicted = 0;
        if self.table.len() >= self.table.cap().get() && !self.table.contains(&fingerprint) {
            let quota = (self.table.cap().get() / 4).max(1);
            while evicted < quota && self.table.pop_lru().is_some() {
                evicted += 1;
            }
            debug!(evicted, capacity = self.table.cap().get(), "memo full, evicted oldest entries");
        }
        self.table.put(fingerprint, ());
        evicted
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}
