use std::sync::{Mutex, MutexGuard, PoisonError};

use attache_core::{Attachment, Category, FileHandle};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{AttachmentPage, AttachmentService, ListFilter, Pagination, ServiceError};

/// In-memory implementation backed by a plain Vec, newest first —
/// the same listing order the remote service serves. Used by tests and
/// by embedded hosts that have no remote endpoint.
#[derive(Default)]
pub struct LocalService {
    attachments: Mutex<Vec<Attachment>>,
}

impl LocalService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with pre-existing records, given newest first.
    pub fn with_attachments(attachments: Vec<Attachment>) -> Self {
        Self {
            attachments: Mutex::new(attachments),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Attachment>> {
        self.attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AttachmentService for LocalService {
    async fn list_attachments(
        &self,
        filter: &ListFilter,
        pagination: &Pagination,
    ) -> Result<AttachmentPage, ServiceError> {
        if pagination.page == 0 {
            return Err(ServiceError::InvalidInput("page is 1-based".into()));
        }
        let attachments = self.lock();
        let matching: Vec<&Attachment> = attachments
            .iter()
            .filter(|a| match filter.category.as_ref() {
                Some(category) if !category.is_none() => a.category == *category,
                _ => true,
            })
            .collect();
        let total = matching.len() as u64;

        let start = (pagination.page as usize - 1) * pagination.limit as usize;
        let items = matching
            .into_iter()
            .skip(start)
            .take(pagination.limit as usize)
            .cloned()
            .collect();
        Ok(AttachmentPage { items, total })
    }

    async fn create_attachments(
        &self,
        category: &Category,
        files: &[FileHandle],
    ) -> Result<Vec<Attachment>, ServiceError> {
        if files.is_empty() {
            return Err(ServiceError::InvalidInput("no files to upload".into()));
        }
        let now = Utc::now();
        let created: Vec<Attachment> = files
            .iter()
            .map(|file| {
                let id = Uuid::new_v4().to_string();
                Attachment {
                    path: format!("{id}/{}", file.name),
                    id,
                    name: file.name.clone(),
                    description: None,
                    mimetype: file.mimetype.clone(),
                    encoding: "binary".into(),
                    category: category.clone(),
                    created_at: now,
                    updated_at: now,
                }
            })
            .collect();

        let mut attachments = self.lock();
        for record in created.iter().rev() {
            attachments.insert(0, record.clone());
        }
        Ok(created)
    }

    async fn delete_attachment(&self, id: &str) -> Result<Attachment, ServiceError> {
        let mut attachments = self.lock();
        match attachments.iter().position(|a| a.id == id) {
            Some(idx) => Ok(attachments.remove(idx)),
            None => Err(ServiceError::NotFound(format!("attachment not found: {id}"))),
        }
    }
}
