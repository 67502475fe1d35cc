//! Back-office commands. All need an administrator session.

use boutique_core::{OrderId, ProductId, SupportThreadId, UserId};
use boutique_storefront::Storefront;
use boutique_storefront::api::{NewProduct, ProductPatch, Shipment};

use super::AdminAction;
use crate::CliError;
use crate::output;

pub async fn run(shop: &Storefront, action: AdminAction) -> Result<(), CliError> {
    let admin = shop.admin()?;
    match action {
        AdminAction::Products => {
            let products = admin.list_products().await?;
            output::products(&products.iter().collect::<Vec<_>>());
        }
        AdminAction::AddProduct {
            name,
            price,
            stock,
            description,
        } => {
            let mut product = NewProduct::new(name, price, stock);
            if let Some(description) = description {
                product = product.with_description(description);
            }
            let created = admin.create_product(&product).await?;
            output::line(&format!("Created product {}.", created.id));
        }
        AdminAction::EditProduct {
            id,
            name,
            price,
            stock,
            description,
            active,
        } => {
            let patch = ProductPatch {
                name,
                description,
                price_cents: price,
                stock_qty: stock,
                active,
            };
            let product = admin.update_product(&ProductId::new(id), &patch).await?;
            output::product(&product);
        }
        AdminAction::DeleteProduct { id } => {
            let ack = admin.delete_product(&ProductId::new(id)).await?;
            output::ack(&ack, "Product deleted.");
        }
        AdminAction::Orders { user } => {
            let user = user.map(UserId::new);
            output::orders(&admin.list_orders(user.as_ref()).await?);
        }
        AdminAction::Order { id } => {
            let id = OrderId::new(id);
            output::order(&admin.get_order(&id).await?);
            output::diagnostics(&admin.order_status(&id).await?);
        }
        AdminAction::Validate { id } => {
            let order = admin.validate_order(&OrderId::new(id)).await?;
            output::line(&format!("Order {} is now {}.", order.id, order.status));
        }
        AdminAction::Ship {
            id,
            carrier,
            tracking,
        } => {
            let mut shipment = Shipment::new(carrier);
            if let Some(tracking) = tracking {
                shipment = shipment.with_tracking_number(tracking);
            }
            let ack = admin.ship_order(&OrderId::new(id), &shipment).await?;
            output::ack(&ack, "Order shipped.");
        }
        AdminAction::Delivered { id } => {
            let ack = admin.mark_delivered(&OrderId::new(id)).await?;
            output::ack(&ack, "Order delivered.");
        }
        AdminAction::Refund { id, amount } => {
            let ack = admin.refund_order(&OrderId::new(id), amount).await?;
            output::ack(&ack, "Order refunded.");
        }
        AdminAction::Threads => output::threads(&admin.list_support_threads().await?),
        AdminAction::Thread { id } => {
            output::thread(&admin.get_support_thread(&SupportThreadId::new(id)).await?);
        }
        AdminAction::Answer { id, message } => {
            let message = admin
                .post_support_message(&SupportThreadId::new(id), &message)
                .await?;
            output::message(&message);
        }
        AdminAction::Close { id } => {
            admin.close_support_thread(&SupportThreadId::new(id)).await?;
            output::line("Thread closed.");
        }
    }
    Ok(())
}
