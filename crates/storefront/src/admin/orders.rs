//! Order fulfilment: validation, shipping, delivery and refunds.
//!
//! Status transitions are enforced by the backend; a refused transition
//! comes back as `Error::Api` with a 400 and the current status in the
//! message.

use boutique_core::{OrderId, UserId};
use tracing::{info, instrument};

use super::AdminClient;
use crate::api::{Ack, Order, OrderDiagnostics, RefundRequest, Shipment};
use crate::error::Result;

impl AdminClient {
    /// All orders, or only those of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` or `AuthError::Unauthenticated` when
    /// the backend refuses the session, or `Error::Api`.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: Option<&UserId>) -> Result<Vec<Order>> {
        Ok(self.api.get(&orders_path(user_id)).await?)
    }

    /// Any customer's order, with items and delivery.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_orders`].
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &OrderId) -> Result<Order> {
        Ok(self.api.get(&format!("/admin/orders/{order_id}")).await?)
    }

    /// Lifecycle timestamps and payments of an order.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_orders`].
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order_status(&self, order_id: &OrderId) -> Result<OrderDiagnostics> {
        Ok(self
            .api
            .get(&format!("/admin/orders/{order_id}/status"))
            .await?)
    }

    /// Validate a created or paid order.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_orders`].
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn validate_order(&self, order_id: &OrderId) -> Result<Order> {
        let order: Order = self
            .api
            .post_empty(&format!("/admin/orders/{order_id}/validate"))
            .await?;
        info!(status = %order.status, "Order validated");
        Ok(order)
    }

    /// Hand a validated or paid order to a carrier.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_orders`].
    #[instrument(skip(self, shipment), fields(order_id = %order_id, carrier = %shipment.carrier))]
    pub async fn ship_order(&self, order_id: &OrderId, shipment: &Shipment) -> Result<Ack> {
        let ack: Ack = self
            .api
            .post(&format!("/admin/orders/{order_id}/ship"), shipment)
            .await?;
        info!("Order shipped");
        Ok(ack)
    }

    /// Record delivery of a shipped order.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_orders`].
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<Ack> {
        let ack: Ack = self
            .api
            .post_empty(&format!("/admin/orders/{order_id}/mark-delivered"))
            .await?;
        info!("Order delivered");
        Ok(ack)
    }

    /// Refund a paid, shipped or delivered order and put its items back in
    /// stock. Without an amount the whole order is refunded.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_orders`].
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn refund_order(
        &self,
        order_id: &OrderId,
        amount_cents: Option<i64>,
    ) -> Result<Ack> {
        let ack: Ack = self
            .api
            .post(
                &format!("/admin/orders/{order_id}/refund"),
                &RefundRequest { amount_cents },
            )
            .await?;
        self.catalog.invalidate_all().await;
        info!("Order refunded");
        Ok(ack)
    }
}

fn orders_path(user_id: Option<&UserId>) -> String {
    match user_id {
        Some(user_id) => {
            let encoded: String =
                url::form_urlencoded::byte_serialize(user_id.as_str().as_bytes()).collect();
            format!("/admin/orders?user_id={encoded}")
        }
        None => "/admin/orders".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_path_filters_by_user() {
        assert_eq!(orders_path(None), "/admin/orders");
        assert_eq!(
            orders_path(Some(&UserId::new("u-1"))),
            "/admin/orders?user_id=u-1"
        );
        assert_eq!(
            orders_path(Some(&UserId::new("a b&c"))),
            "/admin/orders?user_id=a+b%26c"
        );
    }
}
