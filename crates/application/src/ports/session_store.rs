//! Application store port

use sea_domain::User;

/// The shared application store holding the signed-in user.
///
/// The session controller is the only writer; UI code reads it through
/// the selectors.
pub trait SessionStore: Send + Sync {
    /// The signed-in user, if any.
    fn user(&self) -> Option<User>;

    /// Whether the store believes a session exists.
    fn is_authenticated(&self) -> bool;

    /// Whether a login or logout is in progress.
    fn is_loading(&self) -> bool;

    /// Stores the user and marks the session authenticated.
    fn set_user(&self, user: User);

    /// Clears the user and the authenticated flag.
    fn logout_user(&self);

    /// Sets the loading flag.
    fn set_loading(&self, loading: bool);
}
