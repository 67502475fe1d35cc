//! Wire types for the Boutique REST API.
//!
//! Response types tolerate the field drift between backend builds (missing
//! optional fields, `token` vs `access_token`, epoch vs ISO timestamps);
//! unknown fields are ignored everywhere.

use boutique_core::{
    CurrencyCode, DeliveryStatus, OrderId, OrderStatus, PaymentId, Price, ProductId,
    SupportMessageId, SupportThreadId, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(alias = "token")]
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<&'a str>,
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.address.is_none()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Body of `POST /cart/add` and `POST /cart/remove`.
#[derive(Debug, Serialize)]
pub(crate) struct CartMutation<'a> {
    pub product_id: &'a ProductId,
    pub qty: u32,
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub stock_qty: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

impl Product {
    #[must_use]
    pub fn price(&self) -> Price {
        Price::from_cents(self.price_cents, CurrencyCode::EUR)
    }

    /// Whether at least `quantity` units can be ordered.
    #[must_use]
    pub fn can_supply(&self, quantity: u32) -> bool {
        self.active && self.stock_qty >= i64::from(quantity)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Reply to `POST /orders/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    #[serde(default)]
    pub total_cents: Option<i64>,
    #[serde(default)]
    pub status: OrderStatus,
}

/// One line of an order, frozen at checkout prices.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        Price::from_cents(self.unit_price_cents, CurrencyCode::EUR).times(self.quantity)
    }
}

/// Shipping information attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Delivery {
    #[serde(rename = "transporteur", alias = "carrier")]
    pub carrier: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub delivery_status: DeliveryStatus,
}

/// An order. List endpoints may omit `items` and send `items_count`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Only sent by detail and admin endpoints.
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub items_count: Option<usize>,
    #[serde(default)]
    pub total_cents: i64,
    #[serde(default)]
    pub delivery: Option<Delivery>,
}

impl Order {
    #[must_use]
    pub fn total(&self) -> Price {
        Price::from_cents(self.total_cents, CurrencyCode::EUR)
    }

    /// Number of lines, whichever way the backend reported it.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items_count.unwrap_or(self.items.len())
    }
}

/// Body of `POST /orders/{id}/pay`.
#[derive(Debug, Serialize)]
pub(crate) struct PaymentRequest<'a> {
    pub card_number: &'a str,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_name: Option<&'a str>,
}

/// Reply to a successful payment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentReceipt {
    pub payment_id: PaymentId,
    /// Gateway outcome, `SUCCEEDED` for the simulated gateway.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount_cents: Option<i64>,
}

/// Reply to `POST /orders/{id}/cancel`.
///
/// Cancelling a paid order refunds it; `refunded` and `amount_cents` say so.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CancelReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub refunded: bool,
    #[serde(default)]
    pub amount_cents: Option<i64>,
}

impl CancelReceipt {
    /// Refunded amount, if any.
    #[must_use]
    pub fn refund(&self) -> Option<Price> {
        self.amount_cents
            .filter(|_| self.refunded)
            .map(|cents| Price::from_cents(cents, CurrencyCode::EUR))
    }
}

/// One line of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
}

/// Invoice of an order, issued on first request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub order_id: OrderId,
    pub number: String,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    pub total_cents: i64,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl Invoice {
    #[must_use]
    pub fn total(&self) -> Price {
        Price::from_cents(self.total_cents, CurrencyCode::EUR)
    }
}

// =============================================================================
// Support
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct NewThread<'a> {
    pub subject: &'a str,
    pub order_id: Option<&'a OrderId>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewMessage<'a> {
    pub content: &'a str,
}

/// A message inside a support thread.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupportMessage {
    pub id: SupportMessageId,
    pub thread_id: SupportThreadId,
    #[serde(default)]
    pub author_user_id: Option<UserId>,
    #[serde(default)]
    pub author_name: Option<String>,
    pub content: String,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A customer support thread. `messages` is only filled by the detail
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupportThread {
    pub id: SupportThreadId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub subject: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub messages: Vec<SupportMessage>,
}

// =============================================================================
// Admin
// =============================================================================

/// Body of `POST /admin/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock_qty: i64,
    pub active: bool,
}

impl NewProduct {
    /// An active product with no description.
    #[must_use]
    pub fn new(name: impl Into<String>, price_cents: i64, stock_qty: i64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price_cents,
            stock_qty,
            active: true,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Body of `PUT /admin/products/{id}`. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_qty: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ProductPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price_cents.is_none()
            && self.stock_qty.is_none()
            && self.active.is_none()
    }
}

/// Body of `POST /admin/orders/{id}/ship`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    #[serde(rename = "transporteur")]
    pub carrier: String,
    pub tracking_number: Option<String>,
    pub delivery_status: DeliveryStatus,
}

impl Shipment {
    #[must_use]
    pub fn new(carrier: impl Into<String>) -> Self {
        Self {
            carrier: carrier.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tracking_number(mut self, tracking_number: impl Into<String>) -> Self {
        self.tracking_number = Some(tracking_number.into());
        self
    }
}

/// Colissimo, parcel being prepared.
impl Default for Shipment {
    fn default() -> Self {
        Self {
            carrier: "Colissimo".to_string(),
            tracking_number: None,
            delivery_status: DeliveryStatus::Prepared,
        }
    }
}

/// Body of `POST /admin/orders/{id}/refund`. No amount means the full total.
#[derive(Debug, Serialize)]
pub(crate) struct RefundRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
}

/// Acknowledgement returned by admin actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// A payment attempt on an order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub amount_cents: i64,
    /// `SUCCEEDED` or `REFUNDED` with the simulated gateway.
    pub status: String,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Reply to `GET /admin/orders/{id}/status`: an order with every lifecycle
/// timestamp and its payments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderDiagnostics {
    pub order_id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub validated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize")]
    pub refunded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(default)]
    pub delivery: Option<Delivery>,
    #[serde(default)]
    pub items_count: usize,
    #[serde(default)]
    pub total_cents: i64,
}

impl OrderDiagnostics {
    #[must_use]
    pub fn total(&self) -> Price {
        Price::from_cents(self.total_cents, CurrencyCode::EUR)
    }
}
