use std::sync::{Mutex, MutexGuard, PoisonError};

use attache_core::Attachment;

/// Consistent, ordered view of the loaded collection at a point in time.
/// `version` increases on every mutation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub items: Vec<Attachment>,
    pub total_known: u64,
    pub version: u64,
}

type Subscriber = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// Ordered cache of the currently-loaded attachment records plus the
/// last known server total. Mutated only by the pagination engine
/// (append) and the sync coordinator (replace/clear); consumers read
/// snapshots and subscribe for change notifications.
#[derive(Default)]
pub struct CollectionStore {
    inner: Mutex<Inner>,
    subscribers: Mutex<Vec<Subscriber>>,
}

#[derive(Default)]
struct Inner {
    items: Vec<Attachment>,
    total_known: u64,
    version: u64,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked after every mutation with the
    /// post-mutation snapshot.
    pub fn subscribe(&self, subscriber: impl Fn(&Snapshot) + Send + Sync + 'static) {
        self.lock_subscribers().push(Box::new(subscriber));
    }

    /// Append a page of items in server order and record the server's
    /// total. If an incoming id is already present (a refresh interleaved
    /// with an append), the later occurrence wins positionally.
    pub fn append(&self, items: Vec<Attachment>, total_known: u64) {
        let snapshot = {
            let mut inner = self.lock_inner();
            for item in items {
                inner.items.retain(|existing| existing.id != item.id);
                inner.items.push(item);
            }
            inner.total_known = total_known;
            inner.bump()
        };
        self.notify(&snapshot);
    }

    /// Replace the whole collection with a fresh server response.
    pub fn replace_all(&self, items: Vec<Attachment>, total_known: u64) {
        let snapshot = {
            let mut inner = self.lock_inner();
            inner.items = items;
            inner.total_known = total_known;
            inner.bump()
        };
        self.notify(&snapshot);
    }

    pub fn clear(&self) {
        let snapshot = {
            let mut inner = self.lock_inner();
            inner.items.clear();
            inner.total_known = 0;
            inner.bump()
        };
        self.notify(&snapshot);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock_inner().snapshot()
    }

    pub fn len(&self) -> usize {
        self.lock_inner().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_inner().items.is_empty()
    }

    pub fn total_known(&self) -> u64 {
        self.lock_inner().total_known
    }

    pub fn version(&self) -> u64 {
        self.lock_inner().version
    }

    fn notify(&self, snapshot: &Snapshot) {
        for subscriber in self.lock_subscribers().iter() {
            subscriber(snapshot);
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn bump(&mut self) -> Snapshot {
        self.version += 1;
        self.snapshot()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.items.clone(),
            total_known: self.total_known,
            version: self.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use attache_core::Category;
    use chrono::Utc;

    use super::*;

    fn attachment(id: &str) -> Attachment {
        Attachment {
            id: id.into(),
            name: format!("{id}.png"),
            description: None,
            mimetype: "image/png".into(),
            encoding: "binary".into(),
            category: Category::new("image"),
            path: format!("{id}.png"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn append_preserves_server_order() {
        let store = CollectionStore::new();
        store.append(vec![attachment("a"), attachment("b")], 4);
        store.append(vec![attachment("c"), attachment("d")], 4);
        let ids: Vec<String> = store.snapshot().items.into_iter().map(|a| a.id).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        assert_eq!(store.total_known(), 4);
    }

    #[test]
    fn duplicate_id_later_occurrence_wins_positionally() {
        let store = CollectionStore::new();
        store.append(vec![attachment("a"), attachment("b")], 3);
        store.append(vec![attachment("a"), attachment("c")], 3);
        let ids: Vec<String> = store.snapshot().items.into_iter().map(|a| a.id).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn replace_all_discards_previous_contents() {
        let store = CollectionStore::new();
        store.append(vec![attachment("a"), attachment("b")], 2);
        store.replace_all(vec![attachment("c")], 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id, "c");
        assert_eq!(snapshot.total_known, 1);
    }

    #[test]
    fn clear_resets_items_and_total() {
        let store = CollectionStore::new();
        store.append(vec![attachment("a")], 1);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.total_known(), 0);
    }

    #[test]
    fn subscribers_see_every_mutation_with_increasing_versions() {
        let store = CollectionStore::new();
        let count = Arc::new(AtomicU64::new(0));
        let last_version = Arc::new(AtomicU64::new(0));
        {
            let count = count.clone();
            let last_version = last_version.clone();
            store.subscribe(move |snapshot| {
                count.fetch_add(1, Ordering::SeqCst);
                let prev = last_version.swap(snapshot.version, Ordering::SeqCst);
                assert!(snapshot.version > prev);
            });
        }

        store.append(vec![attachment("a")], 1);
        store.replace_all(vec![attachment("b")], 1);
        store.clear();
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(last_version.load(Ordering::SeqCst), store.version());
    }
}
