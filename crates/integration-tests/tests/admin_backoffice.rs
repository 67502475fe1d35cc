//! Integration tests for the administrator back office: access control,
//! product management, order fulfilment and the support desk.

use boutique_core::{DeliveryStatus, OrderId, OrderStatus, ProductId, UserId};
use boutique_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, MockBackend, PRODUCT_A, PRODUCT_B, USER_EMAIL, USER_PASSWORD,
};
use boutique_storefront::Storefront;
use boutique_storefront::admin::AdminClient;
use boutique_storefront::api::{NewProduct, ProductPatch, Shipment};
use boutique_storefront::auth::Credentials;
use boutique_storefront::orders::CardPayment;

async fn logged_in(backend: &MockBackend, email: &str, password: &str) -> Storefront {
    let mut shop = backend.storefront();
    shop.login(&Credentials::new(email, password).expect("valid credentials"))
        .await
        .expect("login");
    shop
}

async fn customer(backend: &MockBackend) -> Storefront {
    logged_in(backend, USER_EMAIL, USER_PASSWORD).await
}

async fn back_office(backend: &MockBackend) -> (Storefront, AdminClient) {
    let shop = logged_in(backend, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let admin = shop.admin().expect("admin session");
    (shop, admin)
}

/// Customer orders 3 x A (1250 cents each).
async fn place_order(shop: &Storefront) -> OrderId {
    shop.cart()
        .add(&ProductId::new(PRODUCT_A), 3)
        .await
        .expect("add A");
    shop.orders().checkout().await.expect("checkout").order_id
}

async fn place_paid_order(shop: &Storefront) -> OrderId {
    let order_id = place_order(shop).await;
    let card = CardPayment::new("4242 4242 4242 4242", 12, 2099, "123").expect("valid card");
    shop.orders().pay(&order_id, &card).await.expect("pay");
    order_id
}

fn admin_requests(backend: &MockBackend) -> usize {
    backend
        .requests()
        .iter()
        .filter(|request| request.contains(" /admin"))
        .count()
}

// =============================================================================
// Access control
// =============================================================================

#[tokio::test]
async fn test_back_office_requires_admin_session() {
    let backend = MockBackend::start().await;

    let anonymous = backend.storefront();
    let err = anonymous.admin().expect_err("no session");
    assert!(err.is_unauthenticated());

    let shop = customer(&backend).await;
    assert!(!shop.is_admin());
    let err = shop.admin().expect_err("customer account");
    assert!(err.is_forbidden());
    assert_eq!(admin_requests(&backend), 0);

    let (shop, _admin) = back_office(&backend).await;
    assert!(shop.is_admin());
}

#[tokio::test]
async fn test_admin_client_stops_working_after_logout() {
    let backend = MockBackend::start().await;
    let (mut shop, admin) = back_office(&backend).await;
    admin.list_products().await.expect("list");

    shop.logout().await;

    let err = admin.list_products().await.expect_err("token gone");
    assert!(err.is_unauthenticated());
    assert!(shop.admin().expect_err("logged out").is_unauthenticated());
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_product_lifecycle_refreshes_catalog() {
    let backend = MockBackend::start().await;
    let (shop, admin) = back_office(&backend).await;
    assert_eq!(shop.catalog().list_products().await.expect("catalog").len(), 3);

    let created = admin
        .create_product(
            &NewProduct::new("  Carnet de voyage ", 1490, 25).with_description("Papier recyclé"),
        )
        .await
        .expect("create");
    assert_eq!(created.name, "Carnet de voyage");
    assert_eq!(created.description.as_deref(), Some("Papier recyclé"));
    assert!(created.active);

    // The cached listing was dropped by the create.
    let listing = shop.catalog().list_products().await.expect("catalog");
    assert!(listing.iter().any(|product| product.id == created.id));

    let updated = admin
        .update_product(
            &created.id,
            &ProductPatch {
                price_cents: Some(990),
                active: Some(false),
                ..ProductPatch::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.price_cents, 990);
    assert_eq!(updated.name, "Carnet de voyage");
    assert!(!updated.active);

    let listing = shop.catalog().list_products().await.expect("catalog");
    assert!(listing.iter().all(|product| product.id != created.id));
    let everything = admin.list_products().await.expect("admin list");
    assert_eq!(everything.len(), 4);

    let ack = admin.delete_product(&created.id).await.expect("delete");
    assert!(ack.ok);
    assert_eq!(ack.message.as_deref(), Some("Produit supprimé définitivement"));
    assert!(shop.catalog().get_product(&created.id).await.is_err());
    assert_eq!(admin.list_products().await.expect("admin list").len(), 3);
}

#[tokio::test]
async fn test_invalid_product_input_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let (_shop, admin) = back_office(&backend).await;
    backend.clear_requests();

    assert!(admin.create_product(&NewProduct::new("   ", 100, 1)).await.is_err());
    assert!(admin.create_product(&NewProduct::new("Bol", -1, 1)).await.is_err());
    assert!(admin.create_product(&NewProduct::new("Bol", 100, -5)).await.is_err());

    let product_a = ProductId::new(PRODUCT_A);
    let empty = admin
        .update_product(&product_a, &ProductPatch::default())
        .await
        .expect_err("empty patch");
    assert_eq!(empty.to_string(), "Invalid input: nothing to update");
    let blank_name = ProductPatch {
        name: Some(String::new()),
        ..ProductPatch::default()
    };
    assert!(admin.update_product(&product_a, &blank_name).await.is_err());

    assert_eq!(admin_requests(&backend), 0);
}

#[tokio::test]
async fn test_deleting_unknown_product() {
    let backend = MockBackend::start().await;
    let (_shop, admin) = back_office(&backend).await;

    let err = admin
        .delete_product(&ProductId::new("nope"))
        .await
        .expect_err("unknown product");
    assert!(err.to_string().contains("Produit introuvable"), "{err}");
}

#[tokio::test]
async fn test_deleting_product_empties_it_from_carts() {
    let backend = MockBackend::start().await;
    backend.seed_server_cart(USER_EMAIL, &[(PRODUCT_A, 2), (PRODUCT_B, 1)]);
    let (_shop, admin) = back_office(&backend).await;

    admin
        .delete_product(&ProductId::new(PRODUCT_A))
        .await
        .expect("delete");

    let cart = backend.server_cart(USER_EMAIL);
    assert!(!cart.contains_key(PRODUCT_A));
    assert_eq!(cart.get(PRODUCT_B), Some(&1));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_order_fulfilment_from_payment_to_delivery() {
    let backend = MockBackend::start().await;
    let shop = customer(&backend).await;
    let order_id = place_paid_order(&shop).await;
    let (_admin_shop, admin) = back_office(&backend).await;

    let all = admin.list_orders(None).await.expect("all orders");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].user_id, Some(UserId::new("u-1")));
    let theirs = admin
        .list_orders(Some(&UserId::new("u-1")))
        .await
        .expect("customer orders");
    assert_eq!(theirs.len(), 1);
    let none = admin
        .list_orders(Some(&UserId::new("u-admin")))
        .await
        .expect("admin orders");
    assert!(none.is_empty());

    let validated = admin.validate_order(&order_id).await.expect("validate");
    assert_eq!(validated.status, OrderStatus::Validated);
    assert_eq!(validated.line_count(), 1);

    let ack = admin
        .ship_order(&order_id, &Shipment::new("Chronopost").with_tracking_number("CP42"))
        .await
        .expect("ship");
    assert!(ack.ok);
    let delivery = shop.orders().tracking(&order_id).await.expect("tracking");
    assert_eq!(delivery.carrier, "Chronopost");
    assert_eq!(delivery.tracking_number.as_deref(), Some("CP42"));
    assert_eq!(delivery.delivery_status, DeliveryStatus::Prepared);

    admin.mark_delivered(&order_id).await.expect("delivered");
    let order = admin.get_order(&order_id).await.expect("order");
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(
        order.delivery.expect("delivery").delivery_status,
        DeliveryStatus::Delivered
    );

    let diagnostics = admin.order_status(&order_id).await.expect("status");
    assert_eq!(diagnostics.status, OrderStatus::Delivered);
    assert!(diagnostics.validated_at.is_some());
    assert!(diagnostics.shipped_at.is_some());
    assert!(diagnostics.delivered_at.is_some());
    assert!(diagnostics.refunded_at.is_none());
    assert_eq!(diagnostics.payments.len(), 1);
    assert_eq!(diagnostics.payment_id.as_ref(), Some(&diagnostics.payments[0].id));
    assert_eq!(diagnostics.total_cents, 3750);
}

#[tokio::test]
async fn test_refund_restores_stock() {
    let backend = MockBackend::start().await;
    let shop = customer(&backend).await;
    let order_id = place_paid_order(&shop).await;
    assert_eq!(backend.stock(PRODUCT_A), Some(7));
    let (_admin_shop, admin) = back_office(&backend).await;

    admin
        .ship_order(&order_id, &Shipment::default())
        .await
        .expect("ship");
    let ack = admin.refund_order(&order_id, None).await.expect("refund");
    assert!(ack.ok);

    assert_eq!(backend.stock(PRODUCT_A), Some(10));
    let diagnostics = admin.order_status(&order_id).await.expect("status");
    assert_eq!(diagnostics.status, OrderStatus::Refunded);
    assert!(diagnostics.refunded_at.is_some());
    assert!(diagnostics.payments.iter().all(|payment| payment.status == "REFUNDED"));

    let seen_by_customer = shop.orders().get(&order_id).await.expect("order");
    assert_eq!(seen_by_customer.status, OrderStatus::Refunded);
}

#[tokio::test]
async fn test_refused_status_transitions() {
    let backend = MockBackend::start().await;
    let shop = customer(&backend).await;
    let unpaid = place_order(&shop).await;
    let (_admin_shop, admin) = back_office(&backend).await;

    let err = admin.mark_delivered(&unpaid).await.expect_err("not shipped");
    assert!(err.to_string().contains("statut actuel: CREE"), "{err}");
    let err = admin.refund_order(&unpaid, None).await.expect_err("not paid");
    assert!(err.to_string().contains("Commande non remboursable"), "{err}");
    let err = admin
        .ship_order(&unpaid, &Shipment::default())
        .await
        .expect_err("not validated");
    assert!(err.to_string().contains("Commande non expédiable"), "{err}");

    shop.orders().cancel(&unpaid).await.expect("cancel");
    let err = admin.validate_order(&unpaid).await.expect_err("cancelled");
    assert!(err.to_string().contains("Commande déjà traitée"), "{err}");
    assert_eq!(
        admin.get_order(&unpaid).await.expect("order").status,
        OrderStatus::Cancelled
    );

    let err = admin
        .get_order(&OrderId::new("o-404"))
        .await
        .expect_err("unknown order");
    assert!(err.to_string().contains("Commande introuvable"), "{err}");
}

// =============================================================================
// Support desk
// =============================================================================

#[tokio::test]
async fn test_support_desk_answers_and_closes_threads() {
    let backend = MockBackend::start().await;
    let shop = customer(&backend).await;
    let thread = shop
        .support()
        .create_thread("Colis abîmé", None)
        .await
        .expect("thread");
    shop.support()
        .post_message(&thread.id, "La tasse est arrivée fêlée.")
        .await
        .expect("message");
    let (_admin_shop, admin) = back_office(&backend).await;

    let threads = admin.list_support_threads().await.expect("threads");
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].user_id, Some(UserId::new("u-1")));
    assert!(!threads[0].closed);

    let reply = admin
        .post_support_message(&thread.id, "  Nous vous renvoyons une tasse.  ")
        .await
        .expect("reply");
    assert_eq!(reply.content, "Nous vous renvoyons une tasse.");
    assert_eq!(reply.author_name.as_deref(), Some("Support Admin"));
    assert!(reply.author_user_id.is_none());

    let detail = admin.get_support_thread(&thread.id).await.expect("detail");
    assert_eq!(detail.messages.len(), 2);

    admin
        .close_support_thread(&thread.id)
        .await
        .expect("close");
    let seen_by_customer = shop.support().get_thread(&thread.id).await.expect("thread");
    assert!(seen_by_customer.closed);
    assert_eq!(seen_by_customer.unread_count, 1);
    assert_eq!(seen_by_customer.messages.len(), 2);
}

#[tokio::test]
async fn test_blank_support_reply_is_rejected_locally() {
    let backend = MockBackend::start().await;
    let shop = customer(&backend).await;
    let thread = shop
        .support()
        .create_thread("Question", None)
        .await
        .expect("thread");
    let (_admin_shop, admin) = back_office(&backend).await;
    backend.clear_requests();

    let err = admin
        .post_support_message(&thread.id, " \n ")
        .await
        .expect_err("blank");
    assert_eq!(err.to_string(), "Invalid input: message cannot be empty");
    assert_eq!(admin_requests(&backend), 0);

    let err = admin
        .close_support_thread(&"t-404".into())
        .await
        .expect_err("unknown thread");
    assert!(err.to_string().contains("Fil de discussion introuvable"), "{err}");
}
