//! Request builders and the worker pool that executes them.

pub mod error;
pub mod fileupload;
pub mod request;
pub mod response;
pub mod service;
pub mod task;

pub use error::{ApiError, ErrorKind};
pub use fileupload::FileUpload;
pub use request::{ApiRequest, HttpMethod, RequestBody};
pub use response::ApiResponse;
pub use service::{ApiService, Delegate};
pub use task::ApiTask;
