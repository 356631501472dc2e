use std::sync::{Mutex, MutexGuard, PoisonError};

use attache_core::{Category, FileHandle};

/// Compose-form state between file selection and submission. Exists only
/// in the explicit picker path; drop-originated uploads bypass it.
#[derive(Debug, Clone, Default)]
pub struct PendingUpload {
    pub category: Category,
    pub files: Vec<FileHandle>,
}

/// Accumulates picked files and the target category for the explicit
/// creation path. Files add up across picker invocations until submit;
/// a failed submit preserves everything so the user can retry without
/// reselecting.
#[derive(Default)]
pub struct IngestionPipeline {
    pending: Mutex<PendingUpload>,
}

impl IngestionPipeline {
    pub fn new(default_category: Category) -> Self {
        Self {
            pending: Mutex::new(PendingUpload {
                category: default_category,
                files: Vec::new(),
            }),
        }
    }

    pub fn set_category(&self, category: Category) {
        self.lock().category = category;
    }

    pub fn category(&self) -> Category {
        self.lock().category.clone()
    }

    pub fn add_files(&self, files: Vec<FileHandle>) {
        self.lock().files.extend(files);
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Advisory picker filter derived from the selected category.
    pub fn accept_types(&self) -> String {
        self.lock().category.accept_types()
    }

    /// Current pending state for submission, if there is anything to
    /// submit. Does not clear: the caller clears via `reset` only after
    /// the create succeeds.
    pub fn submission(&self) -> Option<PendingUpload> {
        let pending = self.lock();
        if pending.files.is_empty() {
            None
        } else {
            Some(pending.clone())
        }
    }

    /// Drop pending files and re-seed the category echo.
    pub fn reset(&self, default_category: Category) {
        let mut pending = self.lock();
        pending.files.clear();
        pending.category = default_category;
    }

    fn lock(&self) -> MutexGuard<'_, PendingUpload> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn file(name: &str) -> FileHandle {
        FileHandle::new(name, "image/png", Bytes::from_static(b"img"))
    }

    #[test]
    fn files_accumulate_across_picker_invocations() {
        let pipeline = IngestionPipeline::new(Category::none());
        pipeline.add_files(vec![file("a.png")]);
        pipeline.add_files(vec![file("b.png"), file("c.png")]);
        assert_eq!(pipeline.file_count(), 3);

        let submission = pipeline.submission().unwrap();
        assert_eq!(
            submission.files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            ["a.png", "b.png", "c.png"]
        );
    }

    #[test]
    fn submission_requires_files_but_not_a_category() {
        let pipeline = IngestionPipeline::new(Category::none());
        assert!(pipeline.submission().is_none());

        pipeline.add_files(vec![file("a.png")]);
        let submission = pipeline.submission().unwrap();
        assert!(submission.category.is_none());
        // Submission does not consume: a failed create retries as-is.
        assert_eq!(pipeline.file_count(), 1);
    }

    #[test]
    fn accept_types_follow_selected_category() {
        let pipeline = IngestionPipeline::new(Category::none());
        assert_eq!(pipeline.accept_types(), "*/*");
        pipeline.set_category(Category::new("video"));
        assert_eq!(pipeline.accept_types(), "video/*");
    }

    #[test]
    fn reset_clears_files_and_reseeds_category() {
        let pipeline = IngestionPipeline::new(Category::new("image"));
        pipeline.add_files(vec![file("a.png")]);
        pipeline.set_category(Category::new("video"));
        pipeline.reset(Category::new("image"));
        assert_eq!(pipeline.file_count(), 0);
        assert_eq!(pipeline.category(), Category::new("image"));
    }
}
