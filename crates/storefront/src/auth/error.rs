//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] boutique_core::EmailError),

    /// Password missing from the login form.
    #[error("password is required")]
    MissingPassword,

    /// Backend rejected the credentials; carries its message.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A token was issued but the profile behind it could not be loaded.
    #[error("profile unavailable: {0}")]
    ProfileUnavailable(#[source] ApiError),

    /// The operation needs a session and there is none (or the backend
    /// stopped accepting the token).
    #[error("not authenticated")]
    Unauthenticated,

    /// Signed in, but the account is not an administrator.
    #[error("administrator rights required")]
    Forbidden,
}
