//! Loading indicators and toast notifications.

mod loading;
mod toast;

pub use loading::{LoadingItem, LoadingKind, LoadingUpdate};
pub use toast::{Toast, ToastAction, ToastKind, ToastRemoval, ToastRequest};
