use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use attache_core::{Attachment, Category, FileHandle};
use attache_service::{AttachmentService, ListFilter, ServiceError};
use tracing::{debug, info};

use crate::config::GalleryConfig;
use crate::dragdrop::{DragDropAdapter, DragState};
use crate::event::{EventBus, GalleryEvent};
use crate::flipcard::{ClickTarget, Face, FlipCardController};
use crate::ingest::IngestionPipeline;
use crate::pagination::{LoadOutcome, PaginationEngine};
use crate::store::{CollectionStore, Snapshot};

/// How close to the bottom (in scroll units) a viewport must be before
/// the next page is requested.
const SCROLL_PROXIMITY: f64 = 40.0;

/// Viewport geometry reported by the host on scroll events.
#[derive(Debug, Clone, Copy)]
pub struct ScrollPosition {
    /// Current scroll offset from the top.
    pub offset: f64,
    /// Visible height of the scroll viewport.
    pub viewport: f64,
    /// Full height of the scrolled content.
    pub content: f64,
}

impl ScrollPosition {
    pub fn distance_to_end(&self) -> f64 {
        (self.content - self.viewport - self.offset).max(0.0)
    }
}

/// The attachment gallery core: owns the loaded collection, the active
/// category filter, the compose form, and the drag surface, and keeps
/// the collection synchronized with the remote service. Rendering is
/// the host's concern; it consumes snapshots and events.
pub struct Gallery {
    service: Arc<dyn AttachmentService>,
    store: Arc<CollectionStore>,
    engine: PaginationEngine,
    ingest: IngestionPipeline,
    dragdrop: DragDropAdapter,
    flipcard: FlipCardController,
    events: Arc<EventBus>,
    filter: Mutex<Category>,
    config: GalleryConfig,
}

impl Gallery {
    pub fn new(service: Arc<dyn AttachmentService>, config: GalleryConfig) -> Self {
        let store = Arc::new(CollectionStore::new());
        let events = Arc::new(EventBus::default());
        {
            let events = events.clone();
            store.subscribe(move |snapshot| {
                events.emit(GalleryEvent::CollectionChanged {
                    version: snapshot.version,
                });
            });
        }
        Self {
            engine: PaginationEngine::new(service.clone(), store.clone(), config.page_limit),
            ingest: IngestionPipeline::new(config.default_category.clone()),
            dragdrop: DragDropAdapter::new(),
            flipcard: FlipCardController::new(),
            service,
            store,
            events,
            filter: Mutex::new(Category::none()),
            config,
        }
    }

    pub fn on_event(&self, listener: impl Fn(&GalleryEvent) + Send + Sync + 'static) {
        self.events.subscribe(listener);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn category(&self) -> Category {
        self.lock_filter().clone()
    }

    pub fn categories(&self) -> &[Category] {
        &self.config.categories
    }

    pub fn creatable(&self) -> bool {
        self.config.creatable
    }

    /// Load the first page. Call once when the gallery becomes visible.
    pub async fn open(&self) -> LoadOutcome {
        self.engine.load_next(&self.list_filter()).await
    }

    /// Switch the active category filter. Returns `None` when the value
    /// is unchanged. On a real change the store empties immediately and
    /// page 1 is fetched under the new filter; anything still in flight
    /// for the old filter lands inert.
    pub async fn set_category(&self, category: Category) -> Option<LoadOutcome> {
        {
            let mut current = self.lock_filter();
            if *current == category {
                return None;
            }
            info!(category = %category, "filter changed");
            *current = category;
        }
        self.engine.reset();
        self.store.clear();
        Some(self.engine.load_next(&self.list_filter()).await)
    }

    /// Scroll trigger. Fires at high frequency; cheap when the viewport
    /// is not near the end, and the engine's in-flight guard absorbs
    /// the rest.
    pub async fn handle_scroll(&self, position: ScrollPosition) -> Option<LoadOutcome> {
        if position.distance_to_end() > SCROLL_PROXIMITY {
            return None;
        }
        Some(self.engine.load_next(&self.list_filter()).await)
    }

    /// Pull-to-refresh: re-fetch page 1 under the current filter and
    /// put the compose form back to its default state.
    pub async fn refresh(&self) -> LoadOutcome {
        let outcome = self.engine.reload(&self.list_filter()).await;
        self.reset_compose();
        outcome
    }

    /// Activate a loaded card. Emits `AttachmentSelected` and returns
    /// the record, or `None` for an id that is not loaded.
    pub fn select(&self, id: &str) -> Option<Attachment> {
        let attachment = self
            .store
            .snapshot()
            .items
            .into_iter()
            .find(|a| a.id == id)?;
        self.events.emit(GalleryEvent::AttachmentSelected {
            attachment: attachment.clone(),
        });
        Some(attachment)
    }

    /// Create one record per file, all tagged with `category`, then
    /// resync from the server and clear the compose surface. Failures
    /// propagate; the store and form are only touched after success.
    pub async fn create(
        &self,
        category: &Category,
        files: &[FileHandle],
    ) -> Result<Vec<Attachment>, ServiceError> {
        let created = self.service.create_attachments(category, files).await?;
        info!(count = created.len(), category = %category, "attachments created");
        self.engine.reload(&self.list_filter()).await;
        self.reset_compose();
        Ok(created)
    }

    /// Delete by id, then resync and clear the compose surface. A miss
    /// on the server propagates as `NotFound` and leaves both the store
    /// and the form untouched; the caller may retry or refresh.
    pub async fn delete(&self, id: &str) -> Result<Attachment, ServiceError> {
        let deleted = self.service.delete_attachment(id).await?;
        info!(id, "attachment deleted");
        self.engine.reload(&self.list_filter()).await;
        self.reset_compose();
        Ok(deleted)
    }

    // --- compose form (explicit ingestion path) ---

    pub fn compose_face(&self) -> Face {
        self.flipcard.face()
    }

    pub fn compose_click(&self, target: ClickTarget) -> Option<Face> {
        if !self.config.creatable {
            return None;
        }
        Some(self.flipcard.click(target))
    }

    pub fn add_files(&self, files: Vec<FileHandle>) {
        if !self.config.creatable {
            return;
        }
        self.ingest.add_files(files);
    }

    pub fn set_compose_category(&self, category: Category) {
        self.ingest.set_category(category);
    }

    pub fn compose_category(&self) -> Category {
        self.ingest.category()
    }

    pub fn compose_accept_types(&self) -> String {
        self.ingest.accept_types()
    }

    pub fn pending_file_count(&self) -> usize {
        self.ingest.file_count()
    }

    /// Submit the accumulated compose form. `Ok(None)` when there is
    /// nothing pending. On success the form resets; on failure it is
    /// preserved for retry.
    pub async fn submit_compose(&self) -> Result<Option<Vec<Attachment>>, ServiceError> {
        if !self.config.creatable {
            return Ok(None);
        }
        let Some(pending) = self.ingest.submission() else {
            return Ok(None);
        };
        let created = self.create(&pending.category, &pending.files).await?;
        Ok(Some(created))
    }

    // --- drop surface ---

    pub fn drag_enter(&self) -> DragState {
        if !self.config.creatable {
            return DragState::Idle;
        }
        self.dragdrop.drag_enter()
    }

    pub fn drag_over(&self) -> DragState {
        self.dragdrop.drag_over()
    }

    pub fn drag_leave(&self) -> DragState {
        self.dragdrop.drag_leave()
    }

    /// Conclude a drag with a drop. Dropped files bypass the compose
    /// form and upload immediately as uncategorized; a file-less drop
    /// is a no-op.
    pub async fn drop_files(
        &self,
        files: Vec<FileHandle>,
    ) -> Result<Vec<Attachment>, ServiceError> {
        if !self.config.creatable {
            return Ok(Vec::new());
        }
        let Some(files) = self.dragdrop.drop_files(files) else {
            debug!("drop carried no files");
            return Ok(Vec::new());
        };
        self.create(&Category::none(), &files).await
    }

    fn reset_compose(&self) {
        self.ingest.reset(self.compose_default());
        self.flipcard.reset();
        self.events.emit(GalleryEvent::ComposeReset);
    }

    /// The compose form's pre-selected category echoes the active filter
    /// when one is set, falling back to the configured default.
    fn compose_default(&self) -> Category {
        let filter = self.lock_filter().clone();
        if filter.is_none() {
            self.config.default_category.clone()
        } else {
            filter
        }
    }

    fn list_filter(&self) -> ListFilter {
        let category = self.lock_filter().clone();
        ListFilter {
            category: if category.is_none() {
                None
            } else {
                Some(category)
            },
        }
    }

    fn lock_filter(&self) -> MutexGuard<'_, Category> {
        self.filter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_end_clamps_at_zero() {
        let at_bottom = ScrollPosition {
            offset: 600.0,
            viewport: 400.0,
            content: 1000.0,
        };
        assert_eq!(at_bottom.distance_to_end(), 0.0);

        let midway = ScrollPosition {
            offset: 100.0,
            viewport: 400.0,
            content: 1000.0,
        };
        assert_eq!(midway.distance_to_end(), 500.0);
    }
}
