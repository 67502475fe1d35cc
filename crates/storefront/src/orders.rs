//! Orders client: checkout, history, payment, cancellation, tracking.
//!
//! Card details are checked locally with the same rules the backend applies
//! (length, Luhn checksum, expiry in the future) so obviously bad input never
//! leaves the device.

use boutique_core::OrderId;
use chrono::{Datelike, NaiveDate, Utc};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use crate::api::{
    ApiClient, CancelReceipt, CheckoutReceipt, Delivery, Invoice, Order, PaymentReceipt,
    PaymentRequest,
};
use crate::error::{Error, Result};

// =============================================================================
// Card payment input
// =============================================================================

/// Card and billing details for `POST /orders/{id}/pay`.
#[derive(Debug, Clone)]
pub struct CardPayment {
    card_number: SecretString,
    exp_month: u8,
    exp_year: u16,
    cvc: SecretString,
    postal_code: Option<String>,
    phone: Option<String>,
    street_number: Option<String>,
    street_name: Option<String>,
}

impl CardPayment {
    /// Validate card details against today's date.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` describing the first invalid field.
    pub fn new(card_number: &str, exp_month: u8, exp_year: u16, cvc: &str) -> Result<Self> {
        Self::new_at(card_number, exp_month, exp_year, cvc, Utc::now().date_naive())
    }

    /// Validate card details against `today`.
    ///
    /// Spaces and dashes in the card number and CVC are ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` describing the first invalid field.
    pub fn new_at(
        card_number: &str,
        exp_month: u8,
        exp_year: u16,
        cvc: &str,
        today: NaiveDate,
    ) -> Result<Self> {
        let number = strip_separators(card_number);
        if !(13..=19).contains(&number.len()) || !is_digits(&number) {
            return Err(invalid("card number must be 13 to 19 digits"));
        }
        if !passes_luhn(&number) {
            return Err(invalid("card number is not valid"));
        }

        let cvc = strip_separators(cvc);
        if !(3..=4).contains(&cvc.len()) || !is_digits(&cvc) {
            return Err(invalid("CVC must be 3 or 4 digits"));
        }

        if !(1..=12).contains(&exp_month) {
            return Err(invalid("expiry month must be between 1 and 12"));
        }
        if !(2000..=2100).contains(&exp_year) {
            return Err(invalid("expiry year must be a four-digit year"));
        }
        let current = (today.year(), today.month());
        if (i32::from(exp_year), u32::from(exp_month)) < current {
            return Err(invalid("card has expired"));
        }

        Ok(Self {
            card_number: SecretString::from(number),
            exp_month,
            exp_year,
            cvc: SecretString::from(cvc),
            postal_code: None,
            phone: None,
            street_number: None,
            street_name: None,
        })
    }

    /// Attach a French postal code (5 digits).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for anything but 5 digits.
    pub fn with_postal_code(mut self, postal_code: &str) -> Result<Self> {
        let postal_code = strip_separators(postal_code);
        if postal_code.len() != 5 || !is_digits(&postal_code) {
            return Err(invalid("postal code must be 5 digits"));
        }
        self.postal_code = Some(postal_code);
        Ok(self)
    }

    /// Attach a French phone number (10 digits starting 01 to 09).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a malformed number.
    pub fn with_phone(mut self, phone: &str) -> Result<Self> {
        let phone: String = phone.chars().filter(char::is_ascii_digit).collect();
        let valid_prefix = phone.starts_with('0') && !phone.starts_with("00");
        if phone.len() != 10 || !valid_prefix {
            return Err(invalid("phone number must be 10 digits starting 01 to 09"));
        }
        self.phone = Some(phone);
        Ok(self)
    }

    /// Attach a street address.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the number is not all digits or the
    /// street name is not 3 to 100 characters with at least 2 letters.
    pub fn with_street(mut self, number: &str, name: &str) -> Result<Self> {
        let number = number.trim();
        if number.is_empty() || !is_digits(number) {
            return Err(invalid("street number must be digits only"));
        }
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        let length = name.chars().count();
        if !(3..=100).contains(&length) {
            return Err(invalid("street name must be 3 to 100 characters"));
        }
        if name.chars().filter(|c| c.is_alphabetic()).count() < 2 {
            return Err(invalid("street name needs at least 2 letters"));
        }
        self.street_number = Some(number.to_string());
        self.street_name = Some(name);
        Ok(self)
    }

    /// Last four digits of the card, safe to display.
    #[must_use]
    pub fn last4(&self) -> &str {
        let number = self.card_number.expose_secret();
        number.get(number.len().saturating_sub(4)..).unwrap_or_default()
    }

    fn as_request(&self) -> PaymentRequest<'_> {
        PaymentRequest {
            card_number: self.card_number.expose_secret(),
            exp_month: self.exp_month,
            exp_year: self.exp_year,
            cvc: self.cvc.expose_secret(),
            postal_code: self.postal_code.as_deref(),
            phone: self.phone.as_deref(),
            street_number: self.street_number.as_deref(),
            street_name: self.street_name.as_deref(),
        }
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidInput(message.to_string())
}

fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

fn is_digits(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

/// Luhn checksum. Numbers made of one repeated digit are rejected too.
fn passes_luhn(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    let Some(first) = bytes.first() else {
        return false;
    };
    if bytes.iter().all(|b| b == first) {
        return false;
    }

    let sum: u32 = bytes
        .iter()
        .rev()
        .enumerate()
        .map(|(position, byte)| {
            let digit = u32::from(byte - b'0');
            if position % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

// =============================================================================
// OrderClient
// =============================================================================

/// Client for the order endpoints. Every call needs a session.
#[derive(Clone)]
pub struct OrderClient {
    api: ApiClient,
}

impl OrderClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Turn the server cart into an order. The server cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a token, or `Error::Api`
    /// if the backend refuses (empty cart, insufficient stock).
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<CheckoutReceipt> {
        self.api.require_token()?;
        let receipt: CheckoutReceipt = self.api.post_empty("/orders/checkout").await?;
        info!(order_id = %receipt.order_id, "Order created");
        Ok(receipt)
    }

    /// The user's orders, newest first as the backend sends them.
    ///
    /// # Errors
    ///
    /// As [`OrderClient::checkout`].
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>> {
        self.api.require_token()?;
        Ok(self.api.get("/orders").await?)
    }

    /// One order with its lines.
    ///
    /// # Errors
    ///
    /// As [`OrderClient::checkout`]; an unknown order is a 404 `Error::Api`.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get(&self, order_id: &OrderId) -> Result<Order> {
        self.api.require_token()?;
        Ok(self.api.get(&format!("/orders/{order_id}")).await?)
    }

    /// Cancel an order. A paid order is refunded.
    ///
    /// # Errors
    ///
    /// As [`OrderClient::checkout`]; the backend refuses orders that
    /// already shipped.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel(&self, order_id: &OrderId) -> Result<CancelReceipt> {
        self.api.require_token()?;
        let receipt: CancelReceipt = self
            .api
            .post_empty(&format!("/orders/{order_id}/cancel"))
            .await?;
        info!(refunded = receipt.refunded, "Order cancelled");
        Ok(receipt)
    }

    /// Pay an order by card.
    ///
    /// # Errors
    ///
    /// As [`OrderClient::checkout`]; the backend refuses orders that are
    /// already paid.
    #[instrument(skip(self, payment), fields(order_id = %order_id, last4 = payment.last4()))]
    pub async fn pay(&self, order_id: &OrderId, payment: &CardPayment) -> Result<PaymentReceipt> {
        self.api.require_token()?;
        let receipt: PaymentReceipt = self
            .api
            .post(&format!("/orders/{order_id}/pay"), &payment.as_request())
            .await?;
        info!(payment_id = %receipt.payment_id, "Order paid");
        Ok(receipt)
    }

    /// Shipping status of an order.
    ///
    /// # Errors
    ///
    /// As [`OrderClient::checkout`]; a 404 `Error::Api` until the order
    /// ships.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn tracking(&self, order_id: &OrderId) -> Result<Delivery> {
        self.api.require_token()?;
        Ok(self
            .api
            .get(&format!("/orders/{order_id}/tracking"))
            .await?)
    }

    /// Invoice of an order.
    ///
    /// # Errors
    ///
    /// As [`OrderClient::checkout`].
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn invoice(&self, order_id: &OrderId) -> Result<Invoice> {
        self.api.require_token()?;
        Ok(self
            .api
            .get(&format!("/orders/{order_id}/invoice"))
            .await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VISA_TEST: &str = "4242 4242 4242 4242";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn card(number: &str, month: u8, year: u16, cvc: &str) -> Result<CardPayment> {
        CardPayment::new_at(number, month, year, cvc, today())
    }

    #[test]
    fn test_valid_card() {
        let payment = card(VISA_TEST, 12, 2027, "123").unwrap();
        assert_eq!(payment.last4(), "4242");

        let request = serde_json::to_value(payment.as_request()).unwrap();
        assert_eq!(request["card_number"], "4242424242424242");
        assert!(request.get("phone").is_none());
    }

    #[test]
    fn test_card_number_rules() {
        assert!(card("4242424242424241", 12, 2027, "123").is_err());
        assert!(card("42424242", 12, 2027, "123").is_err());
        assert!(card("4242-4242-4242-424a", 12, 2027, "123").is_err());
        assert!(card("0000000000000000", 12, 2027, "123").is_err());
        assert!(card("4242-4242-4242-4242", 12, 2027, "123").is_ok());
    }

    #[test]
    fn test_cvc_and_expiry_rules() {
        assert!(card(VISA_TEST, 12, 2027, "12").is_err());
        assert!(card(VISA_TEST, 12, 2027, "12345").is_err());
        assert!(card(VISA_TEST, 13, 2027, "123").is_err());
        assert!(card(VISA_TEST, 0, 2027, "123").is_err());
        assert!(card(VISA_TEST, 5, 2026, "123").is_err());
        assert!(card(VISA_TEST, 6, 2026, "123").is_ok());
        assert!(card(VISA_TEST, 1, 2101, "123").is_err());
    }

    #[test]
    fn test_billing_fields() {
        let base = || card(VISA_TEST, 12, 2027, "1234").unwrap();

        assert!(base().with_postal_code("7500").is_err());
        assert!(base().with_phone("0012345678").is_err());
        assert!(base().with_phone("06 12 34 56 78").is_ok());
        assert!(base().with_street("12b", "rue de la Paix").is_err());
        assert!(base().with_street("12", "r1").is_err());

        let payment = base()
            .with_postal_code("75002")
            .unwrap()
            .with_street("12", "  rue   de la   Paix ")
            .unwrap();
        let request = serde_json::to_value(payment.as_request()).unwrap();
        assert_eq!(request["postal_code"], "75002");
        assert_eq!(request["street_name"], "rue de la Paix");
    }

    #[test]
    fn test_luhn() {
        assert!(passes_luhn("4242424242424242"));
        assert!(passes_luhn("5555555555554444"));
        assert!(!passes_luhn("4242424242424243"));
        assert!(!passes_luhn(""));
    }
}
