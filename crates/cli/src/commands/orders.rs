//! Order commands. All need a session.

use boutique_core::OrderId;
use boutique_storefront::Storefront;
use boutique_storefront::orders::CardPayment;

use super::OrderAction;
use crate::CliError;
use crate::output;

pub async fn run(shop: &Storefront, action: OrderAction) -> Result<(), CliError> {
    let orders = shop.orders();
    match action {
        OrderAction::List => output::orders(&orders.list().await?),
        OrderAction::Show { id } => output::order(&orders.get(&OrderId::new(id)).await?),
        OrderAction::Checkout => {
            let receipt = orders.checkout().await?;
            // Checkout moved stock; cached listings are stale now.
            shop.catalog().invalidate_all().await;
            output::checkout(&receipt);
        }
        OrderAction::Pay {
            id,
            card,
            exp_month,
            exp_year,
            cvc,
            postal_code,
            phone,
            street_number,
            street_name,
        } => {
            let mut payment = CardPayment::new(&card, exp_month, exp_year, &cvc)?;
            if let Some(postal_code) = postal_code {
                payment = payment.with_postal_code(&postal_code)?;
            }
            if let Some(phone) = phone {
                payment = payment.with_phone(&phone)?;
            }
            if let (Some(number), Some(name)) = (street_number, street_name) {
                payment = payment.with_street(&number, &name)?;
            }
            let receipt = orders.pay(&OrderId::new(id), &payment).await?;
            output::payment(&receipt, payment.last4());
        }
        OrderAction::Cancel { id } => {
            let receipt = orders.cancel(&OrderId::new(id)).await?;
            shop.catalog().invalidate_all().await;
            output::cancellation(&receipt);
        }
        OrderAction::Track { id } => output::delivery(&orders.tracking(&OrderId::new(id)).await?),
        OrderAction::Invoice { id } => output::invoice(&orders.invoice(&OrderId::new(id)).await?),
    }
    Ok(())
}
