use std::sync::{Mutex, MutexGuard, PoisonError};

use attache_core::Attachment;

/// Outbound notifications for the embedding host.
#[derive(Debug, Clone)]
pub enum GalleryEvent {
    /// A browse-face card was activated.
    AttachmentSelected { attachment: Attachment },
    /// The collection store changed; carries the new store version.
    CollectionChanged { version: u64 },
    /// The compose form was cleared back to its default state.
    ComposeReset,
}

type Listener = Box<dyn Fn(&GalleryEvent) + Send + Sync>;

/// Fan-out of gallery events to registered listeners, in registration
/// order.
#[derive(Default)]
pub(crate) struct EventBus {
    listeners: Mutex<Vec<Listener>>,
}

impl EventBus {
    pub fn subscribe(&self, listener: impl Fn(&GalleryEvent) + Send + Sync + 'static) {
        self.lock().push(Box::new(listener));
    }

    pub fn emit(&self, event: GalleryEvent) {
        for listener in self.lock().iter() {
            listener(&event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
