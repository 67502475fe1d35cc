//! Integration tests for the anonymous cart and its merge into the server
//! cart at login.

use std::collections::BTreeMap;
use std::sync::Arc;

use boutique_core::ProductId;
use boutique_integration_tests::{
    MockBackend, PRODUCT_A, PRODUCT_B, PRODUCT_C, USER_EMAIL, USER_PASSWORD,
};
use boutique_storefront::auth::Credentials;
use boutique_storefront::storage::{FileStore, KeyValueStore, MemoryStore, SharedStore};

fn credentials() -> Credentials {
    Credentials::new(USER_EMAIL, USER_PASSWORD).expect("valid credentials")
}

fn server_lines(lines: &[(&str, u32)]) -> BTreeMap<String, u32> {
    lines
        .iter()
        .map(|(id, qty)| ((*id).to_string(), *qty))
        .collect()
}

// =============================================================================
// Anonymous cart
// =============================================================================

#[tokio::test]
async fn test_anonymous_cart_stays_on_device() {
    let backend = MockBackend::start().await;
    let shop = backend.storefront();
    let a = ProductId::new(PRODUCT_A);

    let cart = shop.cart();
    assert!(cart.is_local());
    cart.add(&a, 2).await.expect("add");
    cart.increment(&a).await.expect("increment");
    let after = cart.decrement(&a).await.expect("decrement");

    assert_eq!(after.quantity(&a), 2);
    assert!(backend.requests().is_empty());
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn test_login_moves_local_cart_to_server() {
    let backend = MockBackend::start().await;
    let mut shop = backend.storefront();
    let local = shop.local_cart();
    local.add(&ProductId::new(PRODUCT_A), 2).expect("add A");
    local.add(&ProductId::new(PRODUCT_B), 1).expect("add B");

    let outcome = shop.login(&credentials()).await.expect("login");

    assert_eq!(outcome.reconcile.synced, 2);
    assert!(!outcome.reconcile.is_partial_failure());
    assert!(shop.local_cart().get().expect("local").is_empty());
    assert_eq!(
        backend.server_cart(USER_EMAIL),
        server_lines(&[(PRODUCT_A, 2), (PRODUCT_B, 1)])
    );
    assert_eq!(backend.count("POST /cart/add"), 2);

    let cart = shop.cart().view().await.expect("view");
    assert_eq!(cart.quantity(&ProductId::new(PRODUCT_A)), 2);
    assert_eq!(cart.quantity(&ProductId::new(PRODUCT_B)), 1);
}

#[tokio::test]
async fn test_refused_line_is_reported_and_dropped() {
    let backend = MockBackend::start().await;
    backend.reject_product(PRODUCT_B);
    let mut shop = backend.storefront();
    shop.local_cart()
        .add(&ProductId::new(PRODUCT_A), 2)
        .expect("add A");
    shop.local_cart()
        .add(&ProductId::new(PRODUCT_B), 1)
        .expect("add B");

    let outcome = shop.login(&credentials()).await.expect("login still succeeds");

    assert!(shop.is_authenticated());
    assert!(outcome.reconcile.is_partial_failure());
    assert_eq!(outcome.reconcile.synced, 1);
    assert_eq!(outcome.reconcile.failed, vec![ProductId::new(PRODUCT_B)]);
    assert_eq!(outcome.reconcile.attempted(), 2);
    assert_eq!(
        backend.server_cart(USER_EMAIL),
        server_lines(&[(PRODUCT_A, 2)])
    );
    // The refused line is gone from the device too.
    assert!(shop.local_cart().get().expect("local").is_empty());
}

#[tokio::test]
async fn test_merge_adds_to_existing_server_lines() {
    let backend = MockBackend::start().await;
    backend.seed_server_cart(USER_EMAIL, &[(PRODUCT_A, 3)]);
    let mut shop = backend.storefront();
    shop.local_cart()
        .add(&ProductId::new(PRODUCT_A), 2)
        .expect("add");

    shop.login(&credentials()).await.expect("login");

    assert_eq!(
        backend.server_cart(USER_EMAIL),
        server_lines(&[(PRODUCT_A, 5)])
    );
}

#[tokio::test]
async fn test_empty_local_cart_makes_no_cart_calls() {
    let backend = MockBackend::start().await;
    let mut shop = backend.storefront();

    let outcome = shop.login(&credentials()).await.expect("login");

    assert_eq!(outcome.reconcile.attempted(), 0);
    assert!(
        backend
            .requests()
            .iter()
            .all(|request| !request.contains("/cart")),
        "{:?}",
        backend.requests()
    );
}

#[tokio::test]
async fn test_failed_login_keeps_local_cart() {
    let backend = MockBackend::start().await;
    let mut shop = backend.storefront();
    shop.local_cart()
        .add(&ProductId::new(PRODUCT_A), 2)
        .expect("add");

    shop.login(&Credentials::new(USER_EMAIL, "wrong").expect("valid shape"))
        .await
        .expect_err("login must fail");

    assert_eq!(
        shop.local_cart()
            .get()
            .expect("local")
            .quantity(&ProductId::new(PRODUCT_A)),
        2
    );
    assert_eq!(backend.count("POST /cart/add"), 0);
}

#[tokio::test]
async fn test_corrupt_local_cart_is_discarded_at_login() {
    let backend = MockBackend::start().await;
    let store = MemoryStore::shared();
    store.set("local_cart", "{\"items\": 42").expect("write");
    let mut shop = backend.storefront_with_store(Arc::clone(&store));

    let outcome = shop.login(&credentials()).await.expect("login");

    assert_eq!(outcome.reconcile.attempted(), 0);
    assert!(store.get("local_cart").expect("read").is_none());
}

#[tokio::test]
async fn test_reconcile_runs_once_per_login() {
    let backend = MockBackend::start().await;
    let mut shop = backend.storefront();
    shop.local_cart()
        .add(&ProductId::new(PRODUCT_A), 1)
        .expect("add");

    shop.login(&credentials()).await.expect("login");
    let store = Arc::clone(shop.store());
    drop(shop);

    // A later run restoring the session does not push anything again.
    let mut shop = backend.storefront_with_store(store);
    shop.restore().await.expect("restored");
    assert_eq!(backend.count("POST /cart/add"), 1);
    assert_eq!(
        backend.server_cart(USER_EMAIL),
        server_lines(&[(PRODUCT_A, 1)])
    );
}

// =============================================================================
// Server cart
// =============================================================================

#[tokio::test]
async fn test_server_decrement_never_deletes_a_line() {
    let backend = MockBackend::start().await;
    let mut shop = backend.storefront();
    shop.login(&credentials()).await.expect("login");
    let a = ProductId::new(PRODUCT_A);
    let cart = shop.cart();

    cart.add(&a, 2).await.expect("add");
    assert_eq!(cart.decrement(&a).await.expect("decrement").quantity(&a), 1);

    backend.clear_requests();
    assert_eq!(cart.decrement(&a).await.expect("decrement").quantity(&a), 1);
    assert_eq!(backend.count("POST /cart/remove"), 0);

    assert!(cart.remove(&a).await.expect("remove").is_empty());
}

#[tokio::test]
async fn test_server_cart_reports_backend_refusal() {
    let backend = MockBackend::start().await;
    let mut shop = backend.storefront();
    shop.login(&credentials()).await.expect("login");

    let err = shop
        .cart()
        .add(&ProductId::new(PRODUCT_C), 1)
        .await
        .expect_err("sold out");
    assert!(err.to_string().contains("Stock insuffisant"), "{err}");
    assert!(backend.server_cart(USER_EMAIL).is_empty());
}

#[tokio::test]
async fn test_server_cart_clear_removes_every_line() {
    let backend = MockBackend::start().await;
    backend.seed_server_cart(USER_EMAIL, &[(PRODUCT_A, 1), (PRODUCT_B, 4)]);
    let mut shop = backend.storefront();
    shop.login(&credentials()).await.expect("login");

    shop.cart().clear().await.expect("clear");

    assert!(backend.server_cart(USER_EMAIL).is_empty());
    assert_eq!(backend.count("POST /cart/remove"), 2);
}

#[tokio::test]
async fn test_revoked_token_surfaces_as_unauthenticated() {
    let backend = MockBackend::start().await;
    let mut shop = backend.storefront();
    shop.login(&credentials()).await.expect("login");
    backend.revoke_tokens();

    let err = shop.cart().view().await.expect_err("token revoked");
    assert!(err.is_unauthenticated());
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_file_store_keeps_cart_and_token_across_runs() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let open = || -> SharedStore { Arc::new(FileStore::new(dir.path())) };

    let shop = backend.storefront_with_store(open());
    shop.local_cart()
        .add(&ProductId::new(PRODUCT_B), 3)
        .expect("add");
    drop(shop);

    let mut shop = backend.storefront_with_store(open());
    assert_eq!(
        shop.local_cart()
            .get()
            .expect("local")
            .quantity(&ProductId::new(PRODUCT_B)),
        3
    );
    shop.login(&credentials()).await.expect("login");
    drop(shop);

    let mut shop = backend.storefront_with_store(open());
    assert!(shop.restore().await.is_some());
    assert!(shop.local_cart().get().expect("local").is_empty());
    assert_eq!(
        backend.server_cart(USER_EMAIL),
        server_lines(&[(PRODUCT_B, 3)])
    );
}
