//! Anonymous cart kept in device storage.

use boutique_core::{Cart, ProductId};
use tracing::warn;

use crate::storage::{SharedStore, StorageError, load_json, save_json};

/// Storage key of the anonymous cart.
const LOCAL_CART_KEY: &str = "local_cart";

/// The anonymous cart.
///
/// Every operation reads storage, applies the change, and writes back before
/// returning, so the persisted copy is always current. Nothing guards against
/// a second process editing the same data directory; the last write wins.
#[derive(Clone)]
pub struct LocalCart {
    store: SharedStore,
}

impl LocalCart {
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Current contents; an empty cart when nothing was ever stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Corrupt` if the stored cart does not decode,
    /// or `StorageError::Io` if storage cannot be read.
    pub fn get(&self) -> Result<Cart, StorageError> {
        Ok(load_json(self.store.as_ref(), LOCAL_CART_KEY)?.unwrap_or_default())
    }

    /// Add `quantity` units of a product. Adding zero changes nothing.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if storage cannot be read or written.
    pub fn add(&self, product_id: &ProductId, quantity: u32) -> Result<Cart, StorageError> {
        self.update(|cart| {
            cart.add(product_id, quantity);
            quantity > 0
        })
    }

    /// Add one unit of a product, creating the line at quantity 1.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if storage cannot be read or written.
    pub fn increment(&self, product_id: &ProductId) -> Result<Cart, StorageError> {
        self.add(product_id, 1)
    }

    /// Remove one unit of a product. A line at quantity 1, or an absent
    /// line, is left as is.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if storage cannot be read or written.
    pub fn decrement(&self, product_id: &ProductId) -> Result<Cart, StorageError> {
        self.update(|cart| cart.decrement(product_id))
    }

    /// Delete a product line.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if storage cannot be read or written.
    pub fn remove(&self, product_id: &ProductId) -> Result<Cart, StorageError> {
        self.update(|cart| cart.remove(product_id).is_some())
    }

    /// Erase the cart from storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if storage cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(LOCAL_CART_KEY)
    }

    /// Load, apply `change`, and persist if it reports a modification.
    fn update(&self, change: impl FnOnce(&mut Cart) -> bool) -> Result<Cart, StorageError> {
        let mut cart = match self.get() {
            Ok(cart) => cart,
            Err(e @ StorageError::Corrupt { .. }) => {
                warn!(error = %e, "Discarding unreadable local cart");
                Cart::new()
            }
            Err(e) => return Err(e),
        };

        if change(&mut cart) {
            save_json(self.store.as_ref(), LOCAL_CART_KEY, &cart)?;
        }
        Ok(cart)
    }
}

impl std::fmt::Debug for LocalCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCart").finish_non_exhaustive()
    }
}
