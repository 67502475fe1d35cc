//! Product listing.

use boutique_core::ProductId;
use boutique_storefront::Storefront;

use crate::CliError;
use crate::output;

pub async fn list(shop: &Storefront, in_stock: bool) -> Result<(), CliError> {
    let products = shop.catalog().list_products().await?;
    let shown: Vec<_> = products
        .iter()
        .filter(|product| !in_stock || product.can_supply(1))
        .collect();
    output::products(&shown);
    Ok(())
}

pub async fn show(shop: &Storefront, id: &str) -> Result<(), CliError> {
    let product = shop.catalog().get_product(&ProductId::new(id)).await?;
    output::product(&product);
    Ok(())
}
