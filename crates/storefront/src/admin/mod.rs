//! Back-office client for administrator accounts.
//!
//! [`AdminClient`] is only handed out by [`crate::Storefront::admin`] while
//! the session belongs to an administrator. The backend checks again on every
//! `/admin` call; a 403 surfaces as [`AuthError::Forbidden`].
//!
//! Catalog changes made here (product edits, stock restored by a refund)
//! drop the storefront's catalog cache so the next listing is fresh.

mod orders;
mod products;
mod support;

use crate::api::ApiClient;
use crate::auth::{AuthError, AuthSession};
use crate::catalog::CatalogClient;
use crate::error::Result;

/// Client for the `/admin` endpoints.
#[derive(Clone)]
pub struct AdminClient {
    api: ApiClient,
    catalog: CatalogClient,
}

impl AdminClient {
    /// Admin client for the current session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a session, or
    /// `AuthError::Forbidden` when the signed-in account is not an
    /// administrator.
    pub fn for_session(
        auth: &AuthSession,
        api: ApiClient,
        catalog: CatalogClient,
    ) -> Result<Self> {
        if !auth.is_authenticated() {
            return Err(AuthError::Unauthenticated.into());
        }
        if !auth.is_admin() {
            return Err(AuthError::Forbidden.into());
        }
        Ok(Self { api, catalog })
    }
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient").finish_non_exhaustive()
    }
}
