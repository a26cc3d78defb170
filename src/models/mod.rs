//! Request/response data model.

pub mod batch;
pub mod headers;
pub mod request;
pub mod response;

pub use batch::BatchResult;
pub use headers::Headers;
pub use request::{Body, Request, RequestBuilder};
pub use response::Response;
