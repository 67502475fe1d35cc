//! Bearer token persistence.

use secrecy::SecretString;
use tracing::warn;

use crate::storage::{SharedStore, StorageError};

/// Storage key of the bearer token.
const TOKEN_KEY: &str = "token";

/// Persists the bearer credential across restarts.
///
/// The token is opaque: nothing here parses or validates it.
#[derive(Clone)]
pub struct TokenStore {
    store: SharedStore,
}

impl TokenStore {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The stored token, if any.
    ///
    /// An unreadable store is logged and reported as "no token".
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }

    /// Store a token, or erase it with `None` (an empty string also erases).
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the store cannot be written.
    pub fn set(&self, token: Option<&str>) -> Result<(), StorageError> {
        match token {
            Some(token) if !token.is_empty() => self.store.set(TOKEN_KEY, token),
            _ => self.store.remove(TOKEN_KEY),
        }
    }

    /// Erase the token, logging instead of failing.
    pub fn clear(&self) {
        if let Err(e) = self.set(None) {
            warn!(error = %e, "Failed to erase stored token");
        }
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("present", &self.is_present())
            .finish()
    }
}
