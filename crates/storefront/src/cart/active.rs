//! One cart interface for both session states.

use boutique_core::{Cart, ProductId};

use super::{LocalCart, ServerCart};
use crate::error::Result;

/// The cart that is authoritative right now.
///
/// Obtained from [`crate::Storefront::cart`]: `Local` while anonymous,
/// `Server` once authenticated. Both variants follow the same rules, in
/// particular `decrement` never deletes a line.
///
/// Every operation returns the cart contents after the change.
#[derive(Debug, Clone)]
pub enum ActiveCart {
    Local(LocalCart),
    Server(ServerCart),
}

impl ActiveCart {
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    /// Current contents.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the local cart cannot be read, or the
    /// server cart's errors.
    pub async fn view(&self) -> Result<Cart> {
        match self {
            Self::Local(cart) => Ok(cart.get()?),
            Self::Server(cart) => cart.view().await,
        }
    }

    /// Add `quantity` units. Zero is a no-op locally and rejected by the
    /// server cart.
    ///
    /// # Errors
    ///
    /// As [`ActiveCart::view`].
    pub async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<Cart> {
        match self {
            Self::Local(cart) => Ok(cart.add(product_id, quantity)?),
            Self::Server(cart) => {
                cart.add(product_id, quantity).await?;
                cart.view().await
            }
        }
    }

    /// Add one unit.
    ///
    /// # Errors
    ///
    /// As [`ActiveCart::view`].
    pub async fn increment(&self, product_id: &ProductId) -> Result<Cart> {
        self.add(product_id, 1).await
    }

    /// Remove one unit, leaving lines at quantity 1 untouched.
    ///
    /// # Errors
    ///
    /// As [`ActiveCart::view`].
    pub async fn decrement(&self, product_id: &ProductId) -> Result<Cart> {
        match self {
            Self::Local(cart) => Ok(cart.decrement(product_id)?),
            Self::Server(cart) => {
                let current = cart.view().await?;
                if current.quantity(product_id) > 1 {
                    cart.remove(product_id, 1).await?;
                    cart.view().await
                } else {
                    Ok(current)
                }
            }
        }
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// As [`ActiveCart::view`].
    pub async fn remove(&self, product_id: &ProductId) -> Result<Cart> {
        match self {
            Self::Local(cart) => Ok(cart.remove(product_id)?),
            Self::Server(cart) => {
                cart.remove(product_id, 0).await?;
                cart.view().await
            }
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// As [`ActiveCart::view`].
    pub async fn clear(&self) -> Result<()> {
        match self {
            Self::Local(cart) => Ok(cart.clear()?),
            Self::Server(cart) => cart.clear().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_local_variant_matches_local_cart() {
        let local = LocalCart::new(MemoryStore::shared());
        let cart = ActiveCart::Local(local.clone());
        let p1 = ProductId::new("p1");

        assert!(cart.is_local());
        cart.increment(&p1).await.unwrap();
        cart.increment(&p1).await.unwrap();
        assert_eq!(cart.decrement(&p1).await.unwrap().quantity(&p1), 1);
        assert_eq!(cart.decrement(&p1).await.unwrap().quantity(&p1), 1);
        assert_eq!(local.get().unwrap().quantity(&p1), 1);

        assert!(cart.remove(&p1).await.unwrap().is_empty());
        cart.add(&p1, 4).await.unwrap();
        cart.clear().await.unwrap();
        assert!(cart.view().await.unwrap().is_empty());
    }
}
