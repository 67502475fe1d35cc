//! Integration tests for checkout, payment, order follow-up, the catalog
//! cache and support threads.

use std::time::Duration;

use boutique_core::{DeliveryStatus, OrderId, OrderStatus, ProductId};
use boutique_integration_tests::{
    MockBackend, PRODUCT_A, PRODUCT_B, PRODUCT_C, USER_EMAIL, USER_PASSWORD,
};
use boutique_storefront::auth::Credentials;
use boutique_storefront::orders::CardPayment;
use boutique_storefront::storage::MemoryStore;
use boutique_storefront::{Storefront, StorefrontConfig};

const CARD: &str = "4242 4242 4242 4242";

async fn logged_in(backend: &MockBackend) -> Storefront {
    let mut shop = backend.storefront();
    shop.login(&Credentials::new(USER_EMAIL, USER_PASSWORD).expect("valid credentials"))
        .await
        .expect("login");
    shop
}

fn card() -> CardPayment {
    CardPayment::new(CARD, 12, 2099, "123")
        .expect("valid card")
        .with_postal_code("75001")
        .expect("valid postal code")
}

/// Checkout A x2 + B x1: 2 * 1250 + 590 cents.
async fn place_order(backend: &MockBackend, shop: &Storefront) -> OrderId {
    let cart = shop.cart();
    cart.add(&ProductId::new(PRODUCT_A), 2).await.expect("add A");
    cart.add(&ProductId::new(PRODUCT_B), 1).await.expect("add B");
    let receipt = shop.orders().checkout().await.expect("checkout");
    assert!(backend.server_cart(USER_EMAIL).is_empty());
    receipt.order_id
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_checkout_creates_order_awaiting_payment() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;

    let order_id = place_order(&backend, &shop).await;

    let order = shop.orders().get(&order_id).await.expect("order");
    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(order.total_cents, 3090);
    assert_eq!(order.line_count(), 2);
    assert_eq!(backend.stock(PRODUCT_A), Some(8));

    let orders = shop.orders().list().await.expect("list");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(orders[0].line_count(), 2);
}

#[tokio::test]
async fn test_checkout_of_empty_cart_is_refused() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;

    let err = shop.orders().checkout().await.expect_err("empty cart");
    assert!(err.to_string().contains("Panier vide"), "{err}");
}

#[tokio::test]
async fn test_pay_then_cancel_refunds() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;
    let order_id = place_order(&backend, &shop).await;

    let payment = shop.orders().pay(&order_id, &card()).await.expect("pay");
    assert_eq!(payment.status, "SUCCEEDED");
    assert_eq!(payment.amount_cents, Some(3090));

    let again = shop
        .orders()
        .pay(&order_id, &card())
        .await
        .expect_err("already paid");
    assert!(again.to_string().contains("déjà payée"), "{again}");

    let receipt = shop.orders().cancel(&order_id).await.expect("cancel");
    assert!(receipt.refunded);
    assert_eq!(receipt.amount_cents, Some(3090));
    assert!(receipt.refund().is_some());

    let order = shop.orders().get(&order_id).await.expect("order");
    assert_eq!(order.status, OrderStatus::Refunded);
    assert_eq!(backend.stock(PRODUCT_A), Some(10));
}

#[tokio::test]
async fn test_cancel_unpaid_order_has_no_refund() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;
    let order_id = place_order(&backend, &shop).await;

    let receipt = shop.orders().cancel(&order_id).await.expect("cancel");

    assert!(!receipt.refunded);
    assert!(receipt.refund().is_none());
    assert_eq!(
        shop.orders().get(&order_id).await.expect("order").status,
        OrderStatus::Cancelled
    );
}

#[tokio::test]
async fn test_shipped_order_tracking_and_no_cancel() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;
    let order_id = place_order(&backend, &shop).await;

    let err = shop
        .orders()
        .tracking(&order_id)
        .await
        .expect_err("not shipped yet");
    assert!(!err.is_unauthenticated());

    backend.ship_order(order_id.as_str(), "Colissimo", "6A12345678901");
    let delivery = shop.orders().tracking(&order_id).await.expect("tracking");
    assert_eq!(delivery.carrier, "Colissimo");
    assert_eq!(delivery.tracking_number.as_deref(), Some("6A12345678901"));
    assert_eq!(delivery.delivery_status, DeliveryStatus::InTransit);

    shop.orders()
        .cancel(&order_id)
        .await
        .expect_err("shipped orders cannot be cancelled");
}

#[tokio::test]
async fn test_invoice_lists_order_lines() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;
    let order_id = place_order(&backend, &shop).await;

    let invoice = shop.orders().invoice(&order_id).await.expect("invoice");

    assert_eq!(invoice.order_id, order_id);
    assert_eq!(invoice.total_cents, 3090);
    assert_eq!(invoice.lines.len(), 2);
    assert_eq!(
        invoice.lines.iter().map(|line| line.line_total_cents).sum::<i64>(),
        invoice.total_cents
    );
    assert!(invoice.issued_at.is_some());
}

#[tokio::test]
async fn test_orders_need_a_session() {
    let backend = MockBackend::start().await;
    let shop = backend.storefront();

    assert!(shop.orders().list().await.expect_err("anonymous").is_unauthenticated());
    assert!(shop.orders().checkout().await.expect_err("anonymous").is_unauthenticated());
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;

    let err = shop
        .orders()
        .get(&OrderId::new("o-404"))
        .await
        .expect_err("unknown order");
    assert!(err.to_string().contains("Commande introuvable"), "{err}");
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_is_public_and_cached() {
    let backend = MockBackend::start().await;
    let shop = backend.storefront();

    let products = shop.catalog().list_products().await.expect("products");
    assert_eq!(products.len(), 3);
    let sold_out = products
        .iter()
        .find(|product| product.id.as_str() == PRODUCT_C)
        .expect("product C");
    assert!(!sold_out.can_supply(1));

    shop.catalog().list_products().await.expect("cached");
    assert_eq!(backend.count("GET /products"), 1);

    let a = ProductId::new(PRODUCT_A);
    shop.catalog().get_product(&a).await.expect("product");
    shop.catalog().get_product(&a).await.expect("cached");
    assert_eq!(backend.count(&format!("GET /products/{PRODUCT_A}")), 1);

    shop.catalog().invalidate_all().await;
    shop.catalog().list_products().await.expect("refetched");
    assert_eq!(backend.count("GET /products"), 2);
}

#[tokio::test]
async fn test_zero_ttl_disables_catalog_cache() {
    let backend = MockBackend::start().await;
    let config = StorefrontConfig {
        catalog_cache_ttl: Duration::ZERO,
        ..backend.config()
    };
    let shop = Storefront::with_store(&config, MemoryStore::shared()).expect("shop");

    shop.catalog().list_products().await.expect("products");
    shop.catalog().list_products().await.expect("products");
    assert_eq!(backend.count("GET /products"), 2);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let backend = MockBackend::start().await;
    let shop = backend.storefront();

    let err = shop
        .catalog()
        .get_product(&ProductId::new("nope"))
        .await
        .expect_err("unknown product");
    assert!(err.to_string().contains("Produit introuvable"), "{err}");
}

// =============================================================================
// Support
// =============================================================================

#[tokio::test]
async fn test_support_conversation() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;
    let order_id = place_order(&backend, &shop).await;
    let support = shop.support();

    let thread = support
        .create_thread("  Colis abîmé  ", Some(&order_id))
        .await
        .expect("thread");
    assert_eq!(thread.subject, "Colis abîmé");
    assert_eq!(thread.order_id.as_ref(), Some(&order_id));

    let message = support
        .post_message(&thread.id, "La tasse est arrivée cassée.")
        .await
        .expect("message");
    assert_eq!(message.thread_id, thread.id);

    backend.support_reply(thread.id.as_str(), "Nous renvoyons une tasse.");
    let threads = support.list_threads().await.expect("threads");
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].unread_count, 1);

    let full = support.get_thread(&thread.id).await.expect("thread");
    assert_eq!(full.messages.len(), 2);
    assert_eq!(full.messages[1].author_name.as_deref(), Some("Service client"));

    support.mark_read(&thread.id).await.expect("mark read");
    let threads = support.list_threads().await.expect("threads");
    assert_eq!(threads[0].unread_count, 0);
}

#[tokio::test]
async fn test_blank_support_input_is_rejected_locally() {
    let backend = MockBackend::start().await;
    let shop = logged_in(&backend).await;
    backend.clear_requests();

    shop.support()
        .create_thread("   ", None)
        .await
        .expect_err("blank subject");
    assert!(backend.requests().is_empty());
}
