//! Authentication endpoint adapters.

mod http_api;

pub use http_api::HttpAuthApi;
