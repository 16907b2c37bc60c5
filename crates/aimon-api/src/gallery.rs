//! Gallery listing cache
//!
//! Reads go through [`ReadThroughCache::get_or_set`]. Writes patch the cached
//! listing in place instead of invalidating it, so a warm gallery stays warm
//! after creations and likes. The store remains the source of truth: any
//! cache failure on the write path is logged and dropped.

use aimon_db::Creature;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::{CacheStats, ReadThroughCache};
use crate::constants::GALLERY_CACHE_KEY;
use crate::error::AppError;
use crate::store::CreatureStore;

pub struct GalleryCache {
    cache: ReadThroughCache,
    ttl_secs: u64,
    /// Serializes this process's read-modify-write updates of the listing.
    /// Repopulation by readers is not covered.
    write_lock: Mutex<()>,
}

impl GalleryCache {
    pub fn new(cache: ReadThroughCache, ttl_secs: u64) -> Self {
        Self {
            cache,
            ttl_secs,
            write_lock: Mutex::new(()),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// All creatures, newest first
    pub async fn list(&self, store: &dyn CreatureStore) -> Result<Vec<Creature>, AppError> {
        self.cache
            .get_or_set(
                GALLERY_CACHE_KEY,
                || async { store.list().await.map_err(AppError::from) },
                self.ttl_secs,
            )
            .await
    }

    /// Put a freshly created creature at the front of a warm listing
    pub async fn record_created(&self, creature: &Creature) {
        self.patch(creature.id, |list| {
            prepend(list, creature.clone());
            true
        })
        .await;
    }

    /// Swap an updated creature into a warm listing, if it is there
    pub async fn record_updated(&self, creature: &Creature) {
        self.patch(creature.id, |list| replace_by_id(list, creature))
            .await;
    }

    async fn patch<F>(&self, id: i64, change: F)
    where
        F: FnOnce(&mut Vec<Creature>) -> bool,
    {
        let _guard = self.write_lock.lock().await;

        let mut list = match self.cache.peek::<Vec<Creature>>(GALLERY_CACHE_KEY).await {
            Ok(Some(list)) => list,
            Ok(None) => {
                debug!(id, "Gallery cache cold, nothing to patch");
                return;
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to read gallery cache");
                return;
            }
        };

        if !change(&mut list) {
            debug!(id, "Creature not in cached gallery, leaving cache as is");
            return;
        }

        if let Err(e) = self.cache.set(GALLERY_CACHE_KEY, &list, self.ttl_secs).await {
            warn!(id, error = %e, "Failed to write gallery cache");
        }
    }
}

fn prepend(list: &mut Vec<Creature>, creature: Creature) {
    list.insert(0, creature);
}

/// Returns false when no entry has the creature's id
fn replace_by_id(list: &mut [Creature], creature: &Creature) -> bool {
    match list.iter_mut().find(|c| c.id == creature.id) {
        Some(slot) => {
            *slot = creature.clone();
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheBackend, CacheError, MokaBackend};
    use crate::testing::{make_creature, FailingBackend, MemoryStore};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    fn gallery_with(backend: Arc<dyn CacheBackend>) -> GalleryCache {
        GalleryCache::new(ReadThroughCache::new(backend), 300)
    }

    fn gallery() -> GalleryCache {
        gallery_with(Arc::new(MokaBackend::default()))
    }

    async fn cached(gallery: &GalleryCache) -> Option<Vec<Creature>> {
        gallery.cache.peek(GALLERY_CACHE_KEY).await.unwrap()
    }

    #[test]
    fn test_replace_by_id_only_touches_match() {
        let mut list = vec![make_creature(3, "C"), make_creature(2, "B")];
        let mut updated = make_creature(2, "B");
        updated.like_count = 9;

        assert!(replace_by_id(&mut list, &updated));
        assert_eq!(list[1].like_count, 9);
        assert_eq!(list[0], make_creature(3, "C"));

        assert!(!replace_by_id(&mut list, &make_creature(42, "Z")));
        assert_eq!(list.len(), 2);
    }

    #[tokio::test]
    async fn test_cold_list_loads_from_store_once() {
        let store = MemoryStore::with(vec![make_creature(2, "B"), make_creature(1, "A")]);
        let gallery = gallery();

        let first = gallery.list(&store).await.unwrap();
        let second = gallery.list(&store).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_created_is_prepended_to_warm_cache() {
        let store = MemoryStore::with(vec![make_creature(2, "B"), make_creature(1, "A")]);
        let gallery = gallery();
        gallery.list(&store).await.unwrap();

        gallery.record_created(&make_creature(3, "C")).await;

        let list = cached(&gallery).await.unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].id, 3);
        assert_eq!(list[1..], [make_creature(2, "B"), make_creature(1, "A")]);
    }

    #[tokio::test]
    async fn test_like_updates_only_that_entry() {
        let store = MemoryStore::with((1..=6).rev().map(|id| make_creature(id, "X")).collect());
        let gallery = gallery();
        let before = gallery.list(&store).await.unwrap();

        let mut liked = make_creature(5, "X");
        liked.like_count = 1;
        gallery.record_updated(&liked).await;

        let after = cached(&gallery).await.unwrap();
        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(after.iter()) {
            if new.id == 5 {
                assert_eq!(new.like_count, old.like_count + 1);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[tokio::test]
    async fn test_update_for_unknown_id_leaves_cache_unchanged() {
        let store = MemoryStore::with(vec![make_creature(1, "A")]);
        let gallery = gallery();
        let before = gallery.list(&store).await.unwrap();

        gallery.record_updated(&make_creature(99, "Ghost")).await;

        assert_eq!(cached(&gallery).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_writes_on_cold_cache_do_nothing() {
        let gallery = gallery();
        gallery.record_created(&make_creature(1, "A")).await;
        gallery.record_updated(&make_creature(1, "A")).await;
        assert!(cached(&gallery).await.is_none());
    }

    #[tokio::test]
    async fn test_repopulation_matches_store_after_writes() {
        let store = MemoryStore::with(vec![make_creature(1, "A")]);
        let backend = Arc::new(MokaBackend::default());
        let gallery = gallery_with(backend.clone());
        gallery.list(&store).await.unwrap();

        let created = store.insert_creature(make_creature(0, "B"));
        gallery.record_created(&created).await;
        let liked = store.like_creature(1).unwrap();
        gallery.record_updated(&liked).await;

        // Evict by overwriting with an entry that expires immediately
        backend
            .set(GALLERY_CACHE_KEY, serde_json::json!([]), Duration::from_millis(1))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let listed = gallery.list(&store).await.unwrap();
        assert_eq!(listed, store.snapshot());
        assert_eq!(store.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_writes_do_not_count_as_reads() {
        let store = MemoryStore::with(vec![make_creature(1, "A")]);
        let gallery = gallery();
        gallery.list(&store).await.unwrap();

        let mut liked = make_creature(1, "A");
        liked.like_count = 1;
        gallery.record_updated(&liked).await;
        gallery.record_updated(&liked).await;
        gallery.record_created(&make_creature(2, "B")).await;

        let stats = gallery.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_write_restarts_the_ttl() {
        let store = MemoryStore::with(vec![make_creature(1, "A")]);
        let gallery = GalleryCache::new(
            ReadThroughCache::new(Arc::new(MokaBackend::default())),
            2,
        );
        gallery.list(&store).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        gallery.record_created(&make_creature(2, "B")).await;

        // Past the original expiry, inside the refreshed one
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        let list = cached(&gallery).await.unwrap();
        assert_eq!(list.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let store = MemoryStore::with(vec![make_creature(2, "B"), make_creature(1, "A")]);
        let gallery = Arc::new(gallery());
        gallery.list(&store).await.unwrap();

        let mut first = make_creature(1, "A");
        first.like_count = 1;
        let mut second = make_creature(2, "B");
        second.like_count = 1;

        let (g1, g2) = (gallery.clone(), gallery.clone());
        let (a, b) = tokio::join!(
            tokio::spawn(async move { g1.record_updated(&first).await }),
            tokio::spawn(async move { g2.record_updated(&second).await }),
        );
        a.unwrap();
        b.unwrap();

        let list = cached(&gallery).await.unwrap();
        assert!(list.iter().all(|c| c.like_count == 1));
    }

    #[tokio::test]
    async fn test_backend_failures_are_swallowed_on_write() {
        let gallery = gallery_with(Arc::new(FailingBackend));
        gallery.record_created(&make_creature(1, "A")).await;
        gallery.record_updated(&make_creature(1, "A")).await;
    }

    #[tokio::test]
    async fn test_backend_failure_on_read_is_an_error() {
        let store = MemoryStore::with(vec![make_creature(1, "A")]);
        let gallery = gallery_with(Arc::new(FailingBackend));
        let result = gallery.list(&store).await;
        assert!(matches!(
            result,
            Err(AppError::Cache(CacheError::Backend(_)))
        ));
    }
}
