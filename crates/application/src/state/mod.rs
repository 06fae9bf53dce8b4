//! Shared application state.

mod app_store;

pub use app_store::{AppState, AppStore};
