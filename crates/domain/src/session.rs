//! Session lifecycle state.
//!
//! The session controller moves through these states; the UI reads them
//! to decide between the login form, a spinner, and the signed-in shell.

use serde::{Deserialize, Serialize};

/// Lifecycle of an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session, or the last one ended.
    #[default]
    LoggedOut,
    /// Credentials were sent; waiting for the authentication endpoint.
    LoggingIn,
    /// Tokens and user are in place.
    LoggedIn,
    /// Local and remote cleanup in progress.
    LoggingOut,
}

impl SessionState {
    /// Returns true while a login or logout call is in flight.
    #[must_use]
    pub const fn is_transitioning(self) -> bool {
        matches!(self, Self::LoggingIn | Self::LoggingOut)
    }

    /// Returns true if the session is established.
    #[must_use]
    pub const fn is_logged_in(self) -> bool {
        matches!(self, Self::LoggedIn)
    }

    /// Returns true if `next` is a legal successor of this state.
    ///
    /// Any state may fall back to `LoggedOut` (forced logout, failed login),
    /// and logout may start from any settled state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (_, Self::LoggedOut)
                | (Self::LoggedOut | Self::LoggedIn, Self::LoggingIn)
                | (Self::LoggingIn, Self::LoggedIn)
                | (Self::LoggedOut | Self::LoggedIn | Self::LoggingIn, Self::LoggingOut)
        )
    }

    /// Short label for status lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoggedOut => "logged out",
            Self::LoggingIn => "logging in",
            Self::LoggedIn => "logged in",
            Self::LoggingOut => "logging out",
        }
    }
}
