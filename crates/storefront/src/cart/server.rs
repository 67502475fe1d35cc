//! The logged-in user's cart, held by the backend.

use boutique_core::{Cart, ProductId};
use serde::de::IgnoredAny;
use tracing::{debug, instrument};

use crate::api::{ApiClient, CartMutation};
use crate::error::{Error, Result};

/// Adapter over the backend cart endpoints.
///
/// Every call needs a bearer token; without one the call fails with
/// `AuthError::Unauthenticated` before touching the network. Mutations
/// return nothing: call [`ServerCart::view`] for the new contents.
#[derive(Clone)]
pub struct ServerCart {
    api: ApiClient,
}

impl ServerCart {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the current server cart.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a token or when the
    /// backend rejects it, or `Error::Api` for any other failure.
    #[instrument(skip(self))]
    pub async fn view(&self) -> Result<Cart> {
        self.api.require_token()?;
        let cart: Cart = self.api.get("/cart").await?;
        debug!(lines = cart.len(), "Fetched server cart");
        Ok(cart)
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a zero quantity, otherwise as
    /// [`ServerCart::view`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        self.mutate("/cart/add", product_id, quantity).await
    }

    /// Remove `quantity` units of a product; zero deletes the whole line.
    ///
    /// # Errors
    ///
    /// As [`ServerCart::view`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        self.mutate("/cart/remove", product_id, quantity).await
    }

    /// Delete every line, one request per line.
    ///
    /// # Errors
    ///
    /// Stops at the first failed request, leaving later lines in place.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        let cart = self.view().await?;
        for line in &cart {
            self.remove(&line.product_id, 0).await?;
        }
        Ok(())
    }

    async fn mutate(&self, path: &str, product_id: &ProductId, qty: u32) -> Result<()> {
        self.api.require_token()?;
        let body = CartMutation { product_id, qty };
        let _: IgnoredAny = self.api.post(path, &body).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ServerCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCart")
            .field("base_url", &self.api.base_url().as_str())
            .finish()
    }
}
