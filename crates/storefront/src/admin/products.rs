//! Product management.

use boutique_core::ProductId;
use tracing::{info, instrument};

use super::AdminClient;
use crate::api::{Ack, NewProduct, Product, ProductPatch};
use crate::error::{Error, Result};
use crate::support::non_blank;

impl AdminClient {
    /// Every product, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` or `AuthError::Unauthenticated` when
    /// the backend refuses the session, or `Error::Api`.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.api.get("/admin/products").await?)
    }

    /// Create a product. The name is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a blank name or a negative price or
    /// stock, otherwise as [`AdminClient::list_products`].
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        let body = NewProduct {
            name: non_blank(&product.name, "product name")?.to_string(),
            ..product.clone()
        };
        check_amounts(Some(body.price_cents), Some(body.stock_qty))?;

        let created: Product = self.api.post("/admin/products", &body).await?;
        self.catalog.invalidate_all().await;
        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    /// Change some fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an empty patch, a blank name or a
    /// negative price or stock, otherwise as [`AdminClient::list_products`].
    #[instrument(skip(self, patch), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product> {
        if patch.is_empty() {
            return Err(Error::InvalidInput("nothing to update".to_string()));
        }
        let name = patch
            .name
            .as_deref()
            .map(|name| non_blank(name, "product name").map(str::to_string))
            .transpose()?;
        check_amounts(patch.price_cents, patch.stock_qty)?;
        let body = ProductPatch {
            name,
            ..patch.clone()
        };

        let updated: Product = self
            .api
            .put(&format!("/admin/products/{product_id}"), &body)
            .await?;
        self.catalog.invalidate_all().await;
        info!("Product updated");
        Ok(updated)
    }

    /// Delete a product for good, along with cart lines pointing at it.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_products`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: &ProductId) -> Result<Ack> {
        let ack: Ack = self
            .api
            .delete(&format!("/admin/products/{product_id}"))
            .await?;
        self.catalog.invalidate_all().await;
        info!("Product deleted");
        Ok(ack)
    }
}

fn check_amounts(price_cents: Option<i64>, stock_qty: Option<i64>) -> Result<()> {
    if price_cents.is_some_and(|cents| cents < 0) {
        return Err(Error::InvalidInput("price cannot be negative".to_string()));
    }
    if stock_qty.is_some_and(|qty| qty < 0) {
        return Err(Error::InvalidInput("stock cannot be negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_amounts() {
        assert!(check_amounts(Some(0), Some(0)).is_ok());
        assert!(check_amounts(None, None).is_ok());
        assert!(matches!(
            check_amounts(Some(-1), None),
            Err(Error::InvalidInput(msg)) if msg == "price cannot be negative"
        ));
        assert!(matches!(
            check_amounts(Some(100), Some(-3)),
            Err(Error::InvalidInput(msg)) if msg == "stock cannot be negative"
        ));
    }
}
