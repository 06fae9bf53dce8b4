//! Request and response descriptors for the authenticated API client.

mod api;
mod method;
mod response;

pub use api::{ApiRequest, Authorize, RequestOptions};
pub use method::HttpMethod;
pub use response::ApiResponse;
