use lru_cache::LruCache;

use super::StatementHandle;

/// Per-connection cache of prepared statements, keyed by SQL text. When
/// full, the least recently used statement is finalized and removed.
///
/// Statements are checked out for use and checked back in afterwards, so a
/// cached handle is never aliased.
#[derive(Debug)]
pub(crate) struct StatementCache {
    inner: LruCache<String, StatementHandle>,
}

impl StatementCache {
    /// Create a new cache with the given capacity.
    pub(crate) fn new(capacity: usize) -> Self {
        Self { inner: LruCache::new(capacity) }
    }

    /// Remove and return the cached statement for this SQL, if any.
    pub(crate) fn checkout(&mut self, sql: &str) -> Option<StatementHandle> {
        self.inner.remove(sql)
    }

    /// Return a statement to the cache after use, finalizing the least
    /// recently used entry if the cache is at capacity.
    pub(crate) fn checkin(&mut self, sql: &str, mut handle: StatementHandle) {
        // a statement goes back to the cache ready for its next use
        handle.reset();
        handle.clear_bindings();

        if self.inner.capacity() == 0 {
            // caching disabled; handle is finalized on drop
            return;
        }

        if self.inner.len() == self.inner.capacity() && !self.inner.contains_key(sql) {
            // evicted handle finalizes on drop
            let _ = self.inner.remove_lru();
        }

        self.inner.insert(sql.into(), handle);
    }

    /// The number of statements in the cache.
    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    /// Finalize every cached statement.
    pub(crate) fn clear(&mut self) {
        self.inner.clear();
    }
}
