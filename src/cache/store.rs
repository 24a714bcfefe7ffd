//! Cache Store Module
//!
//! Ordered collection of cache entries keyed by request target, with a
//! secondary index by identifier for the response side of a session.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Response cache shared by every proxy session.
///
/// Entries are kept sorted by target so lookups are binary searches. Targets
/// are unique. Entries are never removed: stale entries only lose their body.
#[derive(Debug)]
pub struct CacheStore {
    /// Entries sorted by target
    entries: Vec<CacheEntry>,
    /// Identifier to target index
    ids: HashMap<u64, String>,
    /// Next identifier to hand out
    next_id: u64,
    /// How long a filled entry stays eligible for hits
    expiration: Duration,
    /// Performance statistics
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store with the given expiration window.
    pub fn new(expiration: Duration) -> Self {
        Self {
            entries: Vec::new(),
            ids: HashMap::new(),
            next_id: 1,
            expiration,
            stats: CacheStats::new(),
        }
    }

    /// Returns the configured expiration window.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    fn position(&self, target: &str) -> std::result::Result<usize, usize> {
        self.entries
            .binary_search_by(|entry| entry.target.as_str().cmp(target))
    }

    // == Find By Target ==
    /// Returns a copy of the entry stored for `target`, filled or not.
    pub fn find_by_target(&self, target: &str) -> Result<CacheEntry> {
        self.position(target)
            .map(|index| self.entries[index].clone())
            .map_err(|_| CacheError::EntryNotFound(target.to_string()))
    }

    // == Find Fresh Index ==
    /// Locates a hit-eligible entry for `target`.
    ///
    /// Returns None when no entry matches, when the match has no body yet, or
    /// when it is older than the expiration window. A stale match has its
    /// body cleared as a side effect. Every call counts as a hit or a miss.
    pub fn find_fresh_index(&mut self, target: &str) -> Option<usize> {
        let fresh = match self.position(target) {
            Ok(index) => {
                let expiration = self.expiration;
                let entry = &mut self.entries[index];
                if !entry.is_filled() {
                    None
                } else if entry.is_expired(expiration) {
                    entry.clear();
                    self.stats.record_expiration();
                    None
                } else {
                    Some(index)
                }
            }
            Err(_) => None,
        };

        match fresh {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        fresh
    }

    // == Append ==
    /// Adds an entry in target order and returns its identifier.
    ///
    /// The store assigns the identifier. If an entry for the same target is
    /// already present, nothing is inserted and that entry's identifier is
    /// returned, so the first pending entry for a target wins.
    pub fn append(&mut self, mut entry: CacheEntry) -> u64 {
        match self.position(&entry.target) {
            Ok(index) => self.entries[index].id,
            Err(index) => {
                let id = self.next_id;
                self.next_id += 1;

                entry.id = id;
                entry.body.clear();
                entry.created_at = None;
                self.ids.insert(id, entry.target.clone());
                self.entries.insert(index, entry);
                self.stats.set_total_entries(self.entries.len());
                id
            }
        }
    }

    // == Fill ==
    /// Attaches response bytes to the entry registered under `id`.
    ///
    /// Only an empty entry is filled; later attempts are no-ops. Returns
    /// whether the body was stored.
    pub fn fill(&mut self, id: u64, body: &[u8]) -> bool {
        let Some(target) = self.ids.get(&id) else {
            return false;
        };
        let Ok(index) = self.position(target) else {
            return false;
        };

        let filled = self.entries[index].fill(body);
        if filled {
            self.stats.record_fill();
        }
        filled
    }

    /// Appends a continuation of the response that filled `id`.
    ///
    /// Does nothing when the entry is unknown, pending, or was cleared since.
    pub fn extend(&mut self, id: u64, more: &[u8]) -> bool {
        let Some(target) = self.ids.get(&id) else {
            return false;
        };
        let Ok(index) = self.position(target) else {
            return false;
        };
        self.entries[index].extend(more)
    }

    // == Get By Index ==
    /// Returns a copy of the entry at `index` in target order.
    pub fn get_by_index(&self, index: usize) -> Result<CacheEntry> {
        self.entries
            .get(index)
            .cloned()
            .ok_or(CacheError::IndexOutOfRange(index))
    }

    // == Expire Stale ==
    /// Clears the body of every entry older than the expiration window.
    ///
    /// Returns the number of entries cleared.
    pub fn expire_stale(&mut self) -> usize {
        let expiration = self.expiration;
        let mut cleared = 0;

        for entry in self.entries.iter_mut() {
            if entry.is_filled() && entry.is_expired(expiration) {
                entry.clear();
                cleared += 1;
            }
        }

        for _ in 0..cleared {
            self.stats.record_expiration();
        }
        cleared
    }

    /// Entries in target order.
    pub fn entries(&self) -> &[CacheEntry] {
        &self.entries
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn entry(target: &str) -> CacheEntry {
        CacheEntry::new("GET", target, "HTTP/1.1")
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(Duration::from_secs(4));
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.expiration(), Duration::from_secs(4));
    }

    #[test]
    fn test_find_by_target_empty_store() {
        let store = CacheStore::new(Duration::from_secs(4));

        let result = store.find_by_target("/widget");
        assert!(matches!(result, Err(CacheError::EntryNotFound(_))));
    }

    #[test]
    fn test_find_by_target_requires_exact_match() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        store.append(entry("/a"));

        assert!(store.find_by_target("/a").is_ok());
        assert!(store.find_by_target("/b").is_err());
        assert!(store.find_by_target("/").is_err());
    }

    #[test]
    fn test_append_keeps_target_order() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        store.append(entry("/c"));
        store.append(entry("/a"));
        store.append(entry("/b"));

        let targets: Vec<&str> = store.entries().iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn test_append_assigns_unique_ids() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        let a = store.append(entry("/a"));
        let b = store.append(entry("/b"));

        assert_ne!(a, b);
        assert_eq!(store.find_by_target("/a").unwrap().id, a);
        assert_eq!(store.find_by_target("/b").unwrap().id, b);
    }

    #[test]
    fn test_append_existing_target_reuses_pending_entry() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        let first = store.append(entry("/a"));
        let second = store.append(entry("/a"));

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_fill_by_id() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        store.append(entry("/a"));
        let id = store.append(entry("/b"));

        assert!(store.fill(id, b"OK-B"));
        assert_eq!(store.find_by_target("/b").unwrap().body, b"OK-B");
        assert!(store.find_by_target("/a").unwrap().body.is_empty());
    }

    #[test]
    fn test_fill_first_write_wins() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        let id = store.append(entry("/a"));

        assert!(store.fill(id, b"OK-1"));
        assert!(!store.fill(id, b"OK-2"));
        assert_eq!(store.find_by_target("/a").unwrap().body, b"OK-1");
    }

    #[test]
    fn test_extend_continues_filled_entry() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        let id = store.append(entry("/big"));

        assert!(!store.extend(id, b"early"));
        store.fill(id, b"part-1,");
        assert!(store.extend(id, b"part-2"));
        assert!(!store.extend(999, b"stray"));

        assert_eq!(store.find_by_target("/big").unwrap().body, b"part-1,part-2");
        assert_eq!(store.stats().fills, 1);
    }

    #[test]
    fn test_fill_unknown_id_is_noop() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        store.append(entry("/a"));

        assert!(!store.fill(999, b"OK"));
        assert_eq!(store.stats().fills, 0);
    }

    #[test]
    fn test_find_fresh_index_unfilled_is_miss() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        store.append(entry("/a"));

        assert_eq!(store.find_fresh_index("/a"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_find_fresh_index_hit() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        store.append(entry("/b"));
        let id = store.append(entry("/a"));
        store.fill(id, b"OK-A");

        let index = store.find_fresh_index("/a").unwrap();
        let hit = store.get_by_index(index).unwrap();
        assert_eq!(hit.target, "/a");
        assert_eq!(hit.body, b"OK-A");
        assert_eq!(store.stats().hits, 1);
    }

    #[test]
    fn test_find_fresh_index_expired_clears_body() {
        let mut store = CacheStore::new(Duration::from_millis(50));
        let id = store.append(entry("/a"));
        store.fill(id, b"OK-A");

        sleep(Duration::from_millis(80));

        assert_eq!(store.find_fresh_index("/a"), None);
        let stale = store.find_by_target("/a").unwrap();
        assert!(stale.body.is_empty());
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().expirations, 1);

        // The cleared entry accepts the next response.
        assert!(store.fill(id, b"OK-A2"));
        assert!(store.find_fresh_index("/a").is_some());
    }

    #[test]
    fn test_get_by_index_out_of_range() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        assert!(matches!(
            store.get_by_index(0),
            Err(CacheError::IndexOutOfRange(0))
        ));

        store.append(entry("/a"));
        assert!(store.get_by_index(0).is_ok());
        assert!(matches!(
            store.get_by_index(1),
            Err(CacheError::IndexOutOfRange(1))
        ));
    }

    #[test]
    fn test_expire_stale() {
        let mut store = CacheStore::new(Duration::from_millis(50));
        let a = store.append(entry("/a"));
        store.append(entry("/pending"));
        store.fill(a, b"OK-A");

        sleep(Duration::from_millis(80));

        let b = store.append(entry("/b"));
        store.fill(b, b"OK-B");

        assert_eq!(store.expire_stale(), 1);
        assert!(store.find_by_target("/a").unwrap().body.is_empty());
        assert_eq!(store.find_by_target("/b").unwrap().body, b"OK-B");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_store_stats() {
        let mut store = CacheStore::new(Duration::from_secs(4));
        let id = store.append(entry("/a"));
        store.find_fresh_index("/a"); // miss, pending
        store.fill(id, b"OK");
        store.find_fresh_index("/a"); // hit
        store.find_fresh_index("/nope"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.fills, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
