use async_trait::async_trait;
use attache_core::{Attachment, Category, FileHandle};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Listing constraint. `category: None` means no predicate at all —
/// the server must not be asked to match the empty tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub category: Option<Category>,
}

impl ListFilter {
    pub fn by_category(category: Category) -> Self {
        Self {
            category: Some(category),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page index.
    pub page: u32,
    pub limit: u32,
}

/// One page of a listing, with the server's authoritative total for the
/// active filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentPage {
    pub items: Vec<Attachment>,
    pub total: u64,
}

/// Abstraction over the remote attachment operations.
///
/// The gallery core programs against this trait.
/// `HttpService` speaks the GraphQL wire protocol.
/// `LocalService` is an in-memory implementation for tests and
/// embedded hosts.
#[async_trait]
pub trait AttachmentService: Send + Sync {
    async fn list_attachments(
        &self,
        filter: &ListFilter,
        pagination: &Pagination,
    ) -> Result<AttachmentPage, ServiceError>;

    /// Create one record per file, all tagged with `category`.
    async fn create_attachments(
        &self,
        category: &Category,
        files: &[FileHandle],
    ) -> Result<Vec<Attachment>, ServiceError>;

    /// Delete by id, returning the record's last known state.
    async fn delete_attachment(&self, id: &str) -> Result<Attachment, ServiceError>;
}
