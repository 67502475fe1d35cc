//! Cart commands. Work the same anonymous or logged in.

use boutique_core::ProductId;
use boutique_storefront::Storefront;
use tracing::debug;

use super::CartAction;
use crate::CliError;
use crate::output;

pub async fn run(shop: &Storefront, action: CartAction) -> Result<(), CliError> {
    let cart = shop.cart();
    let contents = match action {
        CartAction::Show => cart.view().await?,
        CartAction::Add { id, quantity } => cart.add(&ProductId::new(id), quantity).await?,
        CartAction::Inc { id } => cart.increment(&ProductId::new(id)).await?,
        CartAction::Dec { id } => cart.decrement(&ProductId::new(id)).await?,
        CartAction::Remove { id } => cart.remove(&ProductId::new(id)).await?,
        CartAction::Clear => {
            cart.clear().await?;
            output::line("Cart emptied.");
            return Ok(());
        }
    };

    // Names and prices are a nicety: show bare ids if the catalog is down.
    let products = match shop.catalog().list_products().await {
        Ok(products) => products,
        Err(e) => {
            debug!(error = %e, "Catalog unavailable, showing product ids only");
            std::sync::Arc::default()
        }
    };
    output::cart(&contents, &products, cart.is_local());
    Ok(())
}
