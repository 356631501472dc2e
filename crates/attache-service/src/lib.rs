mod http;
mod local;
mod traits;

pub use http::HttpService;
pub use local::LocalService;
pub use traits::{AttachmentPage, AttachmentService, ListFilter, Pagination, ServiceError};
