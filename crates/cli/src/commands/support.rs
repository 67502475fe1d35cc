//! Support thread commands. All need a session.

use boutique_core::{OrderId, SupportThreadId};
use boutique_storefront::Storefront;
use tracing::warn;

use super::SupportAction;
use crate::CliError;
use crate::output;

pub async fn run(shop: &Storefront, action: SupportAction) -> Result<(), CliError> {
    let support = shop.support();
    match action {
        SupportAction::List => output::threads(&support.list_threads().await?),
        SupportAction::Show { id } => {
            let id = SupportThreadId::new(id);
            let thread = support.get_thread(&id).await?;
            output::thread(&thread);
            if thread.unread_count > 0
                && let Err(e) = support.mark_read(&id).await
            {
                warn!(error = %e, "Could not mark thread as read");
            }
        }
        SupportAction::Open {
            subject,
            order,
            message,
        } => {
            let order = order.map(OrderId::new);
            let thread = support.create_thread(&subject, order.as_ref()).await?;
            if let Some(message) = message {
                support.post_message(&thread.id, &message).await?;
            }
            output::line(&format!("Opened thread {}.", thread.id));
        }
        SupportAction::Reply { id, message } => {
            let message = support
                .post_message(&SupportThreadId::new(id), &message)
                .await?;
            output::message(&message);
        }
    }
    Ok(())
}
