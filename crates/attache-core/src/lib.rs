pub mod attachment;
pub mod category;
pub mod file;

pub use attachment::Attachment;
pub use category::Category;
pub use file::FileHandle;
