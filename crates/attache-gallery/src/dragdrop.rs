use std::sync::atomic::{AtomicU32, Ordering};

use attache_core::FileHandle;

/// Whether the drop surface should render its hover affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Hovering,
}

/// Tracks drag hover over the creation card. Enter/leave pairs nest when
/// the drag crosses child boundaries, so a depth counter decides when
/// the hover affordance actually clears.
#[derive(Default)]
pub struct DragDropAdapter {
    depth: AtomicU32,
}

impl DragDropAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        if self.depth.load(Ordering::SeqCst) > 0 {
            DragState::Hovering
        } else {
            DragState::Idle
        }
    }

    pub fn drag_enter(&self) -> DragState {
        self.depth.fetch_add(1, Ordering::SeqCst);
        DragState::Hovering
    }

    /// Repeated over-events while hovering; keeps the affordance alive
    /// without touching the depth.
    pub fn drag_over(&self) -> DragState {
        self.state()
    }

    pub fn drag_leave(&self) -> DragState {
        let _ = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| d.checked_sub(1));
        self.state()
    }

    /// Conclude the drag. Returns the dropped files for immediate
    /// submission, or `None` when the payload carried no files.
    pub fn drop_files(&self, files: Vec<FileHandle>) -> Option<Vec<FileHandle>> {
        self.depth.store(0, Ordering::SeqCst);
        if files.is_empty() {
            None
        } else {
            Some(files)
        }
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
    fn nested_enter_leave_clears_only_at_depth_zero() {
        let adapter = DragDropAdapter::new();
        assert_eq!(adapter.drag_enter(), DragState::Hovering);
        assert_eq!(adapter.drag_enter(), DragState::Hovering);
        assert_eq!(adapter.drag_leave(), DragState::Hovering);
        assert_eq!(adapter.drag_leave(), DragState::Idle);
    }

    #[test]
    fn leave_without_enter_stays_idle() {
        let adapter = DragDropAdapter::new();
        assert_eq!(adapter.drag_leave(), DragState::Idle);
        assert_eq!(adapter.state(), DragState::Idle);
    }

    #[test]
    fn drop_yields_files_and_resets_hover() {
        let adapter = DragDropAdapter::new();
        adapter.drag_enter();
        let files = adapter.drop_files(vec![file("a.png")]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(adapter.state(), DragState::Idle);
    }

    #[test]
    fn empty_drop_is_ignored_but_still_resets() {
        let adapter = DragDropAdapter::new();
        adapter.drag_enter();
        assert!(adapter.drop_files(Vec::new()).is_none());
        assert_eq!(adapter.state(), DragState::Idle);
    }
}
