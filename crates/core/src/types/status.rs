//! Status enums for orders and deliveries.
//!
//! The backend uses French wire values; the Rust names are English.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Normal flow is `Created -> Validated -> Paid -> Shipped -> Delivered`.
/// `Cancelled` and `Refunded` are terminal side exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Checkout done, awaiting payment.
    #[default]
    #[serde(rename = "CREE")]
    Created,
    /// Validated by an administrator.
    #[serde(rename = "VALIDEE")]
    Validated,
    #[serde(rename = "PAYEE")]
    Paid,
    #[serde(rename = "EXPEDIEE")]
    Shipped,
    #[serde(rename = "LIVREE")]
    Delivered,
    #[serde(rename = "ANNULEE")]
    Cancelled,
    #[serde(rename = "REMBOURSEE")]
    Refunded,
}

impl OrderStatus {
    /// Whether the customer may still cancel an order in this status.
    ///
    /// Orders that left the warehouse, or already reached a terminal state,
    /// cannot be cancelled.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Created | Self::Validated | Self::Paid)
    }

    /// Whether the order still awaits payment.
    #[must_use]
    pub const fn awaits_payment(self) -> bool {
        matches!(self, Self::Created)
    }

    /// Wire value used by the backend.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Created => "CREE",
            Self::Validated => "VALIDEE",
            Self::Paid => "PAYEE",
            Self::Shipped => "EXPEDIEE",
            Self::Delivered => "LIVREE",
            Self::Cancelled => "ANNULEE",
            Self::Refunded => "REMBOURSEE",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Validated => "validated",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        };
        f.write_str(label)
    }
}

/// Parcel delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryStatus {
    #[default]
    #[serde(rename = "PREPAREE")]
    Prepared,
    #[serde(rename = "EN_COURS")]
    InTransit,
    #[serde(rename = "LIVREE")]
    Delivered,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prepared => write!(f, "prepared"),
            Self::InTransit => write!(f, "in transit"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}
