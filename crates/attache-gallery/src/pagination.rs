use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use attache_service::{AttachmentService, ListFilter, Pagination};
use tracing::{debug, warn};

use crate::store::CollectionStore;

/// What a load attempt did. List-fetch failures are absorbed here
/// (reported as `Failed`, logged, never propagated) so scroll-driven
/// retries stay possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was applied; carries the number of appended items.
    Appended(usize),
    /// Everything the server reported is already loaded; no request made.
    Exhausted,
    /// A fetch for the current epoch is already in flight; no request made.
    AlreadyLoading,
    /// The fetch resolved after a reset invalidated its epoch; discarded.
    Stale,
    /// The fetch failed; state unchanged, a later call may retry.
    Failed,
}

#[derive(Debug, Default, Clone, Copy)]
struct PageState {
    /// Last successfully applied 1-based page, 0 before the first.
    page: u32,
    total_known: Option<u64>,
    loaded: u64,
    epoch: u64,
    in_flight: bool,
}

/// Drives page-by-page loading into the collection store. The in-flight
/// flag serializes fetches within an epoch; the epoch counter makes
/// results from before a reset inert (soft cancellation — there is no
/// hard cancellation of the underlying request).
pub struct PaginationEngine {
    service: Arc<dyn AttachmentService>,
    store: Arc<CollectionStore>,
    limit: u32,
    state: Mutex<PageState>,
}

impl PaginationEngine {
    pub fn new(service: Arc<dyn AttachmentService>, store: Arc<CollectionStore>, limit: u32) -> Self {
        Self {
            service,
            store,
            limit,
            state: Mutex::new(PageState::default()),
        }
    }

    /// Invalidate the current page sequence. Any in-flight fetch keeps
    /// running but its result will be discarded on arrival.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.epoch += 1;
        state.page = 0;
        state.total_known = None;
        state.loaded = 0;
        state.in_flight = false;
        debug!(epoch = state.epoch, "pagination reset");
    }

    /// Fetch the next page under `filter` and append it to the store.
    /// Cheap no-op when a fetch is in flight or the listing is exhausted.
    pub async fn load_next(&self, filter: &ListFilter) -> LoadOutcome {
        let (epoch, page) = {
            let mut state = self.lock();
            if state.in_flight {
                return LoadOutcome::AlreadyLoading;
            }
            if let Some(total) = state.total_known {
                if state.loaded >= total {
                    return LoadOutcome::Exhausted;
                }
            }
            state.in_flight = true;
            (state.epoch, state.page + 1)
        };

        let pagination = Pagination {
            page,
            limit: self.limit,
        };
        let result = self.service.list_attachments(filter, &pagination).await;

        let mut state = self.lock();
        if state.epoch != epoch {
            debug!(stale_epoch = epoch, current = state.epoch, "discarding stale page response");
            return LoadOutcome::Stale;
        }
        match result {
            Ok(response) => {
                let count = response.items.len();
                state.page = page;
                state.total_known = Some(response.total);
                state.loaded += count as u64;
                state.in_flight = false;
                drop(state);
                self.store.append(response.items, response.total);
                LoadOutcome::Appended(count)
            }
            Err(e) => {
                state.in_flight = false;
                warn!(page, error = %e, "page fetch failed");
                LoadOutcome::Failed
            }
        }
    }

    /// Restart the sequence and fetch a fresh page 1, replacing the
    /// store contents wholesale on success. Used after mutations, where
    /// the previous snapshot stays visible until the fresh one arrives.
    pub async fn reload(&self, filter: &ListFilter) -> LoadOutcome {
        let epoch = {
            let mut state = self.lock();
            state.epoch += 1;
            state.page = 0;
            state.total_known = None;
            state.loaded = 0;
            state.in_flight = true;
            state.epoch
        };

        let pagination = Pagination {
            page: 1,
            limit: self.limit,
        };
        let result = self.service.list_attachments(filter, &pagination).await;

        let mut state = self.lock();
        if state.epoch != epoch {
            debug!(stale_epoch = epoch, current = state.epoch, "discarding stale reload response");
            return LoadOutcome::Stale;
        }
        match result {
            Ok(response) => {
                let count = response.items.len();
                state.page = 1;
                state.total_known = Some(response.total);
                state.loaded = count as u64;
                state.in_flight = false;
                drop(state);
                self.store.replace_all(response.items, response.total);
                LoadOutcome::Appended(count)
            }
            Err(e) => {
                state.in_flight = false;
                warn!(error = %e, "reload fetch failed");
                LoadOutcome::Failed
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use attache_core::{Category, FileHandle};
    use attache_service::{AttachmentPage, LocalService, ServiceError};
    use bytes::Bytes;

    use super::*;

    fn file(name: &str) -> FileHandle {
        FileHandle::new(name, "text/plain", Bytes::from_static(b"x"))
    }

    async fn seeded_service(count: usize) -> Arc<LocalService> {
        let svc = LocalService::new();
        for i in 0..count {
            svc.create_attachments(&Category::new("text"), &[file(&format!("f{i}.txt"))])
                .await
                .unwrap();
        }
        Arc::new(svc)
    }

    #[tokio::test]
    async fn sequential_loads_walk_pages_until_exhausted() {
        let store = Arc::new(CollectionStore::new());
        let engine = PaginationEngine::new(seeded_service(5).await, store.clone(), 2);
        let filter = ListFilter::default();

        assert_eq!(engine.load_next(&filter).await, LoadOutcome::Appended(2));
        assert_eq!(engine.load_next(&filter).await, LoadOutcome::Appended(2));
        assert_eq!(engine.load_next(&filter).await, LoadOutcome::Appended(1));
        assert_eq!(store.len(), 5);
        assert_eq!(store.total_known(), 5);
        assert_eq!(engine.load_next(&filter).await, LoadOutcome::Exhausted);
    }

    #[tokio::test]
    async fn reset_restarts_from_page_one() {
        let store = Arc::new(CollectionStore::new());
        let engine = PaginationEngine::new(seeded_service(3).await, store.clone(), 2);
        let filter = ListFilter::default();

        engine.load_next(&filter).await;
        engine.reset();
        store.clear();
        assert_eq!(engine.load_next(&filter).await, LoadOutcome::Appended(2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn reload_replaces_contents() {
        let store = Arc::new(CollectionStore::new());
        let service = seeded_service(3).await;
        let engine = PaginationEngine::new(service.clone(), store.clone(), 10);
        let filter = ListFilter::default();

        engine.load_next(&filter).await;
        let listed = service
            .list_attachments(&filter, &Pagination { page: 1, limit: 10 })
            .await
            .unwrap();
        service.delete_attachment(&listed.items[0].id).await.unwrap();

        assert_eq!(engine.reload(&filter).await, LoadOutcome::Appended(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_known(), 2);
    }

    struct FailingService;

    #[async_trait::async_trait]
    impl AttachmentService for FailingService {
        async fn list_attachments(
            &self,
            _filter: &ListFilter,
            _pagination: &Pagination,
        ) -> Result<AttachmentPage, ServiceError> {
            Err(ServiceError::Internal("network down".into()))
        }

        async fn create_attachments(
            &self,
            _category: &Category,
            _files: &[FileHandle],
        ) -> Result<Vec<attache_core::Attachment>, ServiceError> {
            Err(ServiceError::Internal("network down".into()))
        }

        async fn delete_attachment(
            &self,
            _id: &str,
        ) -> Result<attache_core::Attachment, ServiceError> {
            Err(ServiceError::Internal("network down".into()))
        }
    }

    #[tokio::test]
    async fn failure_is_absorbed_and_leaves_state_retryable() {
        let store = Arc::new(CollectionStore::new());
        let engine = PaginationEngine::new(Arc::new(FailingService), store.clone(), 20);
        let filter = ListFilter::default();

        assert_eq!(engine.load_next(&filter).await, LoadOutcome::Failed);
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
        // Not wedged: the in-flight flag was cleared, so a retry issues.
        assert_eq!(engine.load_next(&filter).await, LoadOutcome::Failed);
    }
}
