pub mod config;
pub mod dragdrop;
pub mod event;
pub mod flipcard;
pub mod gallery;
pub mod ingest;
pub mod pagination;
pub mod store;

pub use config::GalleryConfig;
pub use dragdrop::{DragDropAdapter, DragState};
pub use event::GalleryEvent;
pub use flipcard::{ClickTarget, Face, FlipCardController};
pub use gallery::{Gallery, ScrollPosition};
pub use ingest::{IngestionPipeline, PendingUpload};
pub use pagination::{LoadOutcome, PaginationEngine};
pub use store::{CollectionStore, Snapshot};
