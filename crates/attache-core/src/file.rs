use bytes::Bytes;

/// An in-memory handle to a file selected or dropped by the user,
/// pending upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHandle {
    pub name: String,
    pub mimetype: String,
    pub content: Bytes,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, mimetype: impl Into<String>, content: Bytes) -> Self {
        Self {
            name: name.into(),
            mimetype: mimetype.into(),
            content,
        }
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
