//! Unified error handling.
//!
//! Provides a unified `Error` type for every storefront operation. The
//! layer-specific errors ([`AuthError`], [`ApiError`], [`StorageError`])
//! convert into it with `?`.

use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Storefront error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Authentication failed or is required.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Backend call failed for a reason unrelated to authentication.
    #[error("API error: {0}")]
    Api(ApiError),

    /// Device storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Caller input rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A 401 from the backend always means the bearer token is missing or no
/// longer accepted, so it surfaces as [`AuthError::Unauthenticated`]; a 403
/// means the account lacks admin rights and surfaces as
/// [`AuthError::Forbidden`]. Login handles its own 401 and 403 before this
/// conversion applies.
impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            Self::Auth(AuthError::Unauthenticated)
        } else if err.is_forbidden() {
            Self::Auth(AuthError::Forbidden)
        } else {
            Self::Api(err)
        }
    }
}

impl Error {
    /// Whether this error means "log in first".
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Auth(AuthError::Unauthenticated))
    }

    /// Whether this error means "admin rights required".
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Auth(AuthError::Forbidden))
    }
}

/// Result type alias for `Error`.
pub type Result<T> = std::result::Result<T, Error>;
