//! End-to-end test support for the Boutique storefront client.
//!
//! [`MockBackend`] is an in-process axum server speaking the backend's REST
//! dialect: auth, products, cart, orders, support threads and the `/admin`
//! back office. It keeps state in
//! memory, records every request, and can be told to fail in the ways the
//! client has to cope with (profile endpoint down, a product refused at
//! cart-add, revoked tokens).
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p boutique-integration-tests
//! ```
//!
//! No external services are needed; each test starts its own backend on
//! `127.0.0.1:0`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use boutique_storefront::storage::{MemoryStore, SharedStore};
use boutique_storefront::{Storefront, StorefrontConfig};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

pub use axum::http::StatusCode as Status;

/// Seeded customer account.
pub const USER_EMAIL: &str = "client@boutique.fr";
pub const USER_PASSWORD: &str = "secret123";

/// Seeded administrator account.
pub const ADMIN_EMAIL: &str = "admin@boutique.fr";
pub const ADMIN_PASSWORD: &str = "admin-secret";

/// Seeded products: `A` and `B` in stock, `C` sold out.
pub const PRODUCT_A: &str = "A";
pub const PRODUCT_B: &str = "B";
pub const PRODUCT_C: &str = "C";

const EPOCH_BASE: f64 = 1_760_000_000.0;

// =============================================================================
// In-memory backend state
// =============================================================================

#[derive(Debug, Clone)]
struct User {
    id: String,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    address: Option<String>,
    is_admin: bool,
}

impl User {
    fn profile(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "address": self.address,
            "is_admin": self.is_admin,
        })
    }
}

#[derive(Debug, Clone)]
struct Product {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    stock_qty: i64,
    active: bool,
}

impl Product {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "price_cents": self.price_cents,
            "stock_qty": self.stock_qty,
            "active": self.active,
        })
    }
}

#[derive(Debug, Clone)]
struct OrderLine {
    product_id: String,
    name: String,
    unit_price_cents: i64,
    quantity: u32,
}

#[derive(Debug, Clone)]
struct Order {
    id: String,
    email: String,
    user_id: String,
    status: &'static str,
    lines: Vec<OrderLine>,
    created_at: f64,
    delivery: Option<Value>,
    /// `validated_at`, `shipped_at`... keyed by field name.
    stamps: BTreeMap<&'static str, f64>,
    payments: Vec<Value>,
}

impl Order {
    fn total_cents(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| line.unit_price_cents * i64::from(line.quantity))
            .sum()
    }

    fn summary(&self) -> Value {
        json!({
            "id": self.id,
            "status": self.status,
            "created_at": self.created_at,
            "total_cents": self.total_cents(),
            "items_count": self.lines.len(),
        })
    }

    fn detail(&self) -> Value {
        let items: Vec<Value> = self
            .lines
            .iter()
            .map(|line| {
                json!({
                    "id": format!("{}-{}", self.id, line.product_id),
                    "product_id": line.product_id,
                    "name": line.name,
                    "unit_price_cents": line.unit_price_cents,
                    "quantity": line.quantity,
                })
            })
            .collect();
        json!({
            "id": self.id,
            "user_id": self.user_id,
            "status": self.status,
            "created_at": self.created_at,
            "total_cents": self.total_cents(),
            "items": items,
            "delivery": self.delivery,
        })
    }

    fn diagnostics(&self) -> Value {
        let stamp = |field: &str| self.stamps.get(field).copied();
        json!({
            "order_id": self.id,
            "user_id": self.user_id,
            "status": self.status,
            "created_at": self.created_at,
            "validated_at": stamp("validated_at"),
            "shipped_at": stamp("shipped_at"),
            "delivered_at": stamp("delivered_at"),
            "cancelled_at": stamp("cancelled_at"),
            "refunded_at": stamp("refunded_at"),
            "payment_id": self.payments.first().map(|payment| payment["id"].clone()),
            "payments": self.payments,
            "delivery": self.delivery,
            "items_count": self.lines.len(),
            "total_cents": self.total_cents(),
        })
    }

    fn refund_payments(&mut self) {
        for payment in &mut self.payments {
            payment["status"] = json!("REFUNDED");
        }
    }
}

#[derive(Debug, Clone)]
struct Thread {
    id: String,
    email: String,
    user_id: String,
    closed: bool,
    subject: String,
    order_id: Option<String>,
    messages: Vec<Value>,
    unread: u32,
    created_at: f64,
}

impl Thread {
    fn to_json(&self, with_messages: bool) -> Value {
        let mut thread = json!({
            "id": self.id,
            "user_id": self.user_id,
            "order_id": self.order_id,
            "subject": self.subject,
            "closed": self.closed,
            "created_at": self.created_at,
            "unread_count": self.unread,
        });
        if with_messages {
            thread["messages"] = Value::Array(self.messages.clone());
        }
        thread
    }
}

#[derive(Debug, Default)]
struct Db {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    carts: HashMap<String, BTreeMap<String, u32>>,
    products: BTreeMap<String, Product>,
    orders: Vec<Order>,
    threads: Vec<Thread>,
    next_id: u64,
    requests: Vec<String>,
    profile_failure: Option<StatusCode>,
    rejected_products: HashSet<String>,
}

impl Db {
    fn seeded() -> Self {
        let mut db = Self::default();
        db.users.insert(
            USER_EMAIL.to_string(),
            User {
                id: "u-1".to_string(),
                email: USER_EMAIL.to_string(),
                password: USER_PASSWORD.to_string(),
                first_name: "Camille".to_string(),
                last_name: "Martin".to_string(),
                address: None,
                is_admin: false,
            },
        );
        db.users.insert(
            ADMIN_EMAIL.to_string(),
            User {
                id: "u-admin".to_string(),
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
                first_name: "Alex".to_string(),
                last_name: "Durand".to_string(),
                address: None,
                is_admin: true,
            },
        );
        for (id, name, price_cents, stock_qty) in [
            (PRODUCT_A, "Tasse en grès", 1250, 10),
            (PRODUCT_B, "Savon au lait d'ânesse", 590, 10),
            (PRODUCT_C, "Bougie parfumée", 1990, 0),
        ] {
            db.products.insert(
                id.to_string(),
                Product {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: format!("{name} - fait main"),
                    price_cents,
                    stock_qty,
                    active: true,
                },
            );
        }
        db
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    #[allow(clippy::cast_precision_loss)]
    fn now(&self) -> f64 {
        EPOCH_BASE + self.next_id as f64
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<String, Response> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token invalide ou expiré"))
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<String, Response> {
        let email = self.authenticate(headers)?;
        if self.users.get(&email).is_some_and(|user| user.is_admin) {
            Ok(email)
        } else {
            Err(error(StatusCode::FORBIDDEN, "Accès administrateur requis"))
        }
    }

    fn user_id(&self, email: &str) -> String {
        self.users
            .get(email)
            .map(|user| user.id.clone())
            .unwrap_or_default()
    }

    fn any_order_mut(&mut self, order_id: &str) -> Result<&mut Order, Response> {
        self.orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or_else(|| error(StatusCode::NOT_FOUND, "Commande introuvable"))
    }

    fn any_thread_mut(&mut self, thread_id: &str) -> Result<&mut Thread, Response> {
        self.threads
            .iter_mut()
            .find(|thread| thread.id == thread_id)
            .ok_or_else(|| error(StatusCode::NOT_FOUND, "Fil de discussion introuvable"))
    }

    fn restock(&mut self, lines: &[OrderLine]) {
        for line in lines {
            if let Some(product) = self.products.get_mut(&line.product_id) {
                product.stock_qty += i64::from(line.quantity);
                if product.stock_qty > 0 {
                    product.active = true;
                }
            }
        }
    }

    fn order_mut(&mut self, email: &str, order_id: &str) -> Result<&mut Order, Response> {
        self.orders
            .iter_mut()
            .find(|order| order.id == order_id && order.email == email)
            .ok_or_else(|| error(StatusCode::NOT_FOUND, "Commande introuvable"))
    }

    fn thread_mut(&mut self, email: &str, thread_id: &str) -> Result<&mut Thread, Response> {
        self.threads
            .iter_mut()
            .find(|thread| thread.id == thread_id && thread.email == email)
            .ok_or_else(|| error(StatusCode::NOT_FOUND, "Fil introuvable"))
    }
}

type Shared = Arc<Mutex<Db>>;
type Reply = Result<Json<Value>, Response>;

fn lock(shared: &Shared) -> MutexGuard<'_, Db> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn qty_field(body: &Value) -> u32 {
    body.get("qty")
        .and_then(Value::as_u64)
        .and_then(|qty| u32::try_from(qty).ok())
        .unwrap_or(1)
}

// =============================================================================
// Handlers: auth
// =============================================================================

async fn login(State(shared): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut db = lock(&shared);
    let email = str_field(&body, "email");
    let profile = db
        .users
        .get(email)
        .filter(|user| user.password == str_field(&body, "password"))
        .map(User::profile)
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Email ou mot de passe incorrect"))?;

    let token = db.next_id("tok");
    db.tokens.insert(token.clone(), email.to_string());
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": profile,
    })))
}

async fn me(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let db = lock(&shared);
    let email = db.authenticate(&headers)?;
    if let Some(status) = db.profile_failure {
        return Err(error(status, "Service profil indisponible"));
    }
    db.users
        .get(&email)
        .map(|user| Json(user.profile()))
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Utilisateur introuvable"))
}

async fn logout(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&shared);
    let _ = db.authenticate(&headers)?;
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    {
        db.tokens.remove(token);
    }
    Ok(Json(json!({ "ok": true })))
}

async fn register(State(shared): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut db = lock(&shared);
    let email = str_field(&body, "email").to_string();
    if db.users.contains_key(&email) {
        return Err(error(StatusCode::BAD_REQUEST, "Email déjà utilisé"));
    }
    let user = User {
        id: db.next_id("u"),
        email: email.clone(),
        password: str_field(&body, "password").to_string(),
        first_name: str_field(&body, "first_name").to_string(),
        last_name: str_field(&body, "last_name").to_string(),
        address: body
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_string),
        is_admin: false,
    };
    let profile = user.profile();
    db.users.insert(email, user);
    Ok(Json(profile))
}

async fn update_profile(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let user = db
        .users
        .get_mut(&email)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Utilisateur introuvable"))?;
    if let Some(first_name) = body.get("first_name").and_then(Value::as_str) {
        user.first_name = first_name.to_string();
    }
    if let Some(last_name) = body.get("last_name").and_then(Value::as_str) {
        user.last_name = last_name.to_string();
    }
    if let Some(address) = body.get("address").and_then(Value::as_str) {
        user.address = Some(address.to_string());
    }
    Ok(Json(user.profile()))
}

// =============================================================================
// Handlers: catalog and cart
// =============================================================================

async fn list_products(State(shared): State<Shared>) -> Reply {
    let db = lock(&shared);
    Ok(Json(Value::Array(
        db.products
            .values()
            .filter(|product| product.active)
            .map(Product::to_json)
            .collect(),
    )))
}

async fn get_product(State(shared): State<Shared>, Path(id): Path<String>) -> Reply {
    let db = lock(&shared);
    db.products
        .get(&id)
        .map(|product| Json(product.to_json()))
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Produit introuvable"))
}

async fn view_cart(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let mut total_cents = 0;
    let items: Vec<Value> = db
        .carts
        .get(&email)
        .into_iter()
        .flatten()
        .filter_map(|(product_id, quantity)| {
            let product = db.products.get(product_id)?;
            let line_total = product.price_cents * i64::from(*quantity);
            total_cents += line_total;
            Some(json!({
                "id": format!("line-{product_id}"),
                "product_id": product_id,
                "name": product.name,
                "unit_price_cents": product.price_cents,
                "quantity": quantity,
                "total_cents": line_total,
            }))
        })
        .collect();
    Ok(Json(json!({ "items": items, "total_cents": total_cents })))
}

async fn add_to_cart(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let product_id = str_field(&body, "product_id").to_string();
    let qty = qty_field(&body);

    if db.rejected_products.contains(&product_id) {
        return Err(error(StatusCode::BAD_REQUEST, "Produit indisponible"));
    }
    let stock = db
        .products
        .get(&product_id)
        .map(|product| product.stock_qty)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Produit introuvable"))?;

    let cart = db.carts.entry(email).or_default();
    let wanted = cart.get(&product_id).copied().unwrap_or(0) + qty;
    if i64::from(wanted) > stock {
        return Err(error(StatusCode::BAD_REQUEST, "Stock insuffisant"));
    }
    cart.insert(product_id, wanted);
    Ok(Json(json!({ "ok": true })))
}

async fn remove_from_cart(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let product_id = str_field(&body, "product_id");
    let qty = body
        .get("qty")
        .and_then(Value::as_u64)
        .and_then(|qty| u32::try_from(qty).ok())
        .unwrap_or(0);

    let cart = db.carts.entry(email).or_default();
    let current = cart
        .get(product_id)
        .copied()
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Article absent du panier"))?;
    if qty == 0 || qty >= current {
        cart.remove(product_id);
    } else {
        cart.insert(product_id.to_string(), current - qty);
    }
    Ok(Json(json!({ "ok": true })))
}

// =============================================================================
// Handlers: orders
// =============================================================================

async fn checkout(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let cart = db.carts.remove(&email).unwrap_or_default();
    if cart.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Panier vide"));
    }

    let mut lines = Vec::new();
    for (product_id, quantity) in cart {
        if let Some(product) = db.products.get_mut(&product_id) {
            product.stock_qty -= i64::from(quantity);
            lines.push(OrderLine {
                product_id,
                name: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity,
            });
        }
    }
    let order = Order {
        id: db.next_id("o"),
        user_id: db.user_id(&email),
        email,
        status: "CREE",
        lines,
        created_at: db.now(),
        delivery: None,
        stamps: BTreeMap::new(),
        payments: Vec::new(),
    };
    let reply = json!({
        "order_id": order.id,
        "total_cents": order.total_cents(),
        "status": order.status,
    });
    db.orders.push(order);
    Ok(Json(reply))
}

async fn list_orders(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let db = lock(&shared);
    let email = db.authenticate(&headers)?;
    Ok(Json(Value::Array(
        db.orders
            .iter()
            .rev()
            .filter(|order| order.email == email)
            .map(Order::summary)
            .collect(),
    )))
}

async fn get_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    Ok(Json(db.order_mut(&email, &id)?.detail()))
}

async fn pay_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let payment_id = db.next_id("pay");
    let now = db.now();
    let order = db.order_mut(&email, &id)?;
    if order.status != "CREE" {
        return Err(error(StatusCode::BAD_REQUEST, "Commande déjà payée ou traitée"));
    }
    if str_field(&body, "card_number").len() < 13 {
        return Err(error(StatusCode::UNPROCESSABLE_ENTITY, "Le numéro de carte est invalide."));
    }
    order.status = "PAYEE";
    order.payments.push(json!({
        "id": payment_id,
        "amount_cents": order.total_cents(),
        "status": "SUCCEEDED",
        "created_at": now,
    }));
    Ok(Json(json!({
        "payment_id": payment_id,
        "status": "SUCCEEDED",
        "amount_cents": order.total_cents(),
    })))
}

async fn cancel_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let now = db.now();
    let order = db.order_mut(&email, &id)?;
    let was_paid = match order.status {
        "CREE" => false,
        "PAYEE" => true,
        _ => {
            return Err(error(
                StatusCode::BAD_REQUEST,
                "Cette commande ne peut pas être annulée",
            ));
        }
    };
    if was_paid {
        order.status = "REMBOURSEE";
        order.stamps.insert("refunded_at", now);
        order.refund_payments();
    } else {
        order.status = "ANNULEE";
        order.stamps.insert("cancelled_at", now);
    }
    let total_cents = order.total_cents();
    let lines = order.lines.clone();
    db.restock(&lines);

    let mut reply = json!({ "ok": true, "message": "Commande annulée avec succès" });
    if was_paid {
        reply["refunded"] = json!(true);
        reply["amount_cents"] = json!(total_cents);
    }
    Ok(Json(reply))
}

async fn track_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    db.order_mut(&email, &id)?
        .delivery
        .clone()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Aucune livraison pour cette commande"))
}

async fn order_invoice(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let order = db.order_mut(&email, &id)?.clone();
    let lines: Vec<Value> = order
        .lines
        .iter()
        .map(|line| {
            json!({
                "product_id": line.product_id,
                "name": line.name,
                "unit_price_cents": line.unit_price_cents,
                "quantity": line.quantity,
                "line_total_cents": line.unit_price_cents * i64::from(line.quantity),
            })
        })
        .collect();
    Ok(Json(json!({
        "id": format!("inv-{}", order.id),
        "order_id": order.id,
        "number": format!("FAC-2025-{}", order.id),
        "lines": lines,
        "total_cents": order.total_cents(),
        "issued_at": order.created_at,
    })))
}

// =============================================================================
// Handlers: support
// =============================================================================

async fn create_thread(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let thread = Thread {
        id: db.next_id("t"),
        user_id: db.user_id(&email),
        closed: false,
        email,
        subject: str_field(&body, "subject").to_string(),
        order_id: body
            .get("order_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        messages: Vec::new(),
        unread: 0,
        created_at: db.now(),
    };
    let reply = thread.to_json(false);
    db.threads.push(thread);
    Ok(Json(reply))
}

async fn list_threads(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let db = lock(&shared);
    let email = db.authenticate(&headers)?;
    Ok(Json(Value::Array(
        db.threads
            .iter()
            .filter(|thread| thread.email == email)
            .map(|thread| thread.to_json(false))
            .collect(),
    )))
}

async fn get_thread(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    Ok(Json(db.thread_mut(&email, &id)?.to_json(true)))
}

async fn post_message(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    let message_id = db.next_id("m");
    let now = db.now();
    let user_id = db.users.get(&email).map(|user| user.id.clone());
    let thread = db.thread_mut(&email, &id)?;
    let message = json!({
        "id": message_id,
        "thread_id": thread.id,
        "author_user_id": user_id,
        "content": str_field(&body, "content"),
        "created_at": now,
    });
    thread.messages.push(message.clone());
    Ok(Json(message))
}

async fn mark_thread_read(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    let email = db.authenticate(&headers)?;
    db.thread_mut(&email, &id)?.unread = 0;
    Ok(Json(json!({ "ok": true })))
}

// =============================================================================
// Handlers: admin
// =============================================================================

async fn admin_list_products(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let db = lock(&shared);
    db.require_admin(&headers)?;
    Ok(Json(Value::Array(
        db.products.values().map(Product::to_json).collect(),
    )))
}

async fn admin_create_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), Response> {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    let name = str_field(&body, "name").trim();
    if name.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Le nom du produit est obligatoire"));
    }
    let product = Product {
        id: db.next_id("prod"),
        name: name.to_string(),
        description: str_field(&body, "description").to_string(),
        price_cents: body.get("price_cents").and_then(Value::as_i64).unwrap_or_default(),
        stock_qty: body.get("stock_qty").and_then(Value::as_i64).unwrap_or_default(),
        active: body.get("active").and_then(Value::as_bool).unwrap_or(true),
    };
    let reply = product.to_json();
    db.products.insert(product.id.clone(), product);
    Ok((StatusCode::CREATED, Json(reply)))
}

async fn admin_update_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    let product = db
        .products
        .get_mut(&id)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Produit introuvable"))?;
    if let Some(name) = body.get("name").and_then(Value::as_str) {
        product.name = name.trim().to_string();
    }
    if let Some(description) = body.get("description").and_then(Value::as_str) {
        product.description = description.to_string();
    }
    if let Some(price_cents) = body.get("price_cents").and_then(Value::as_i64) {
        product.price_cents = price_cents;
    }
    if let Some(stock_qty) = body.get("stock_qty").and_then(Value::as_i64) {
        product.stock_qty = stock_qty;
    }
    if let Some(active) = body.get("active").and_then(Value::as_bool) {
        product.active = active;
    }
    Ok(Json(product.to_json()))
}

async fn admin_delete_product(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    if db.products.remove(&id).is_none() {
        return Err(error(StatusCode::NOT_FOUND, "Produit introuvable"));
    }
    for cart in db.carts.values_mut() {
        cart.remove(&id);
    }
    Ok(Json(json!({ "ok": true, "message": "Produit supprimé définitivement" })))
}

async fn admin_list_orders(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let db = lock(&shared);
    db.require_admin(&headers)?;
    let user_id = params.get("user_id");
    Ok(Json(Value::Array(
        db.orders
            .iter()
            .filter(|order| user_id.is_none_or(|user_id| &order.user_id == user_id))
            .map(Order::detail)
            .collect(),
    )))
}

async fn admin_get_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    Ok(Json(db.any_order_mut(&id)?.detail()))
}

async fn admin_order_status(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    Ok(Json(db.any_order_mut(&id)?.diagnostics()))
}

/// Refuse the action unless the order is in one of the `allowed` statuses.
fn require_status(order: &Order, allowed: &[&str], refusal: &str) -> Result<(), Response> {
    if allowed.contains(&order.status) {
        Ok(())
    } else {
        Err(error(
            StatusCode::BAD_REQUEST,
            &format!("{refusal} (statut actuel: {})", order.status),
        ))
    }
}

async fn admin_validate_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    let now = db.now();
    let order = db.any_order_mut(&id)?;
    require_status(order, &["CREE", "PAYEE"], "Commande déjà traitée")?;
    order.status = "VALIDEE";
    order.stamps.insert("validated_at", now);
    Ok(Json(order.detail()))
}

async fn admin_ship_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    let now = db.now();
    let order = db.any_order_mut(&id)?;
    require_status(order, &["VALIDEE", "PAYEE"], "Commande non expédiable")?;
    order.status = "EXPEDIEE";
    order.stamps.insert("shipped_at", now);
    order.delivery = Some(json!({
        "transporteur": str_field(&body, "transporteur"),
        "tracking_number": body.get("tracking_number").cloned().unwrap_or(Value::Null),
        "delivery_status": str_field(&body, "delivery_status"),
    }));
    Ok(Json(json!({ "ok": true, "message": format!("Commande {id} expédiée avec succès") })))
}

async fn admin_mark_delivered(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    let now = db.now();
    let order = db.any_order_mut(&id)?;
    require_status(order, &["EXPEDIEE"], "Commande non expédiée")?;
    order.status = "LIVREE";
    order.stamps.insert("delivered_at", now);
    if let Some(delivery) = order.delivery.as_mut() {
        delivery["delivery_status"] = json!("LIVREE");
    }
    Ok(Json(json!({ "ok": true, "message": format!("Commande {id} marquée comme livrée") })))
}

async fn admin_refund_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    let now = db.now();
    let order = db.any_order_mut(&id)?;
    require_status(order, &["PAYEE", "EXPEDIEE", "LIVREE"], "Commande non remboursable")?;
    if order.payments.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Aucun paiement trouvé"));
    }
    order.status = "REMBOURSEE";
    order.stamps.insert("refunded_at", now);
    order.refund_payments();
    let lines = order.lines.clone();
    db.restock(&lines);
    Ok(Json(json!({ "ok": true, "message": format!("Commande {id} remboursée avec succès") })))
}

async fn admin_list_threads(State(shared): State<Shared>, headers: HeaderMap) -> Reply {
    let db = lock(&shared);
    db.require_admin(&headers)?;
    Ok(Json(Value::Array(
        db.threads.iter().map(|thread| thread.to_json(false)).collect(),
    )))
}

async fn admin_get_thread(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    Ok(Json(db.any_thread_mut(&id)?.to_json(true)))
}

async fn admin_close_thread(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    db.any_thread_mut(&id)?.closed = true;
    Ok(Json(json!({ "ok": true })))
}

async fn admin_post_message(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut db = lock(&shared);
    db.require_admin(&headers)?;
    let message_id = db.next_id("m");
    let now = db.now();
    let thread = db.any_thread_mut(&id)?;
    let message = json!({
        "id": message_id,
        "thread_id": thread.id,
        "author_user_id": null,
        "author_name": "Support Admin",
        "content": str_field(&body, "content"),
        "created_at": now,
    });
    thread.messages.push(message.clone());
    thread.unread += 1;
    Ok(Json(message))
}

// =============================================================================
// MockBackend
// =============================================================================

async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Not Found")
}

async fn record_request(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    lock(&shared)
        .requests
        .push(format!("{} {}", request.method(), request.uri().path()));
    next.run(request).await
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
        .route("/auth/register", post(register))
        .route("/auth/profile", put(update_profile))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/cart", get(view_cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/remove", post(remove_from_cart))
        .route("/orders", get(list_orders))
        .route("/orders/checkout", post(checkout))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/pay", post(pay_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/tracking", get(track_order))
        .route("/orders/{id}/invoice", get(order_invoice))
        .route("/support/threads", get(list_threads).post(create_thread))
        .route("/support/threads/{id}", get(get_thread))
        .route("/support/threads/{id}/messages", post(post_message))
        .route("/support/threads/{id}/mark-read", post(mark_thread_read))
        .route(
            "/admin/products",
            get(admin_list_products).post(admin_create_product),
        )
        .route(
            "/admin/products/{id}",
            put(admin_update_product).delete(admin_delete_product),
        )
        .route("/admin/orders", get(admin_list_orders))
        .route("/admin/orders/{id}", get(admin_get_order))
        .route("/admin/orders/{id}/status", get(admin_order_status))
        .route("/admin/orders/{id}/validate", post(admin_validate_order))
        .route("/admin/orders/{id}/ship", post(admin_ship_order))
        .route("/admin/orders/{id}/mark-delivered", post(admin_mark_delivered))
        .route("/admin/orders/{id}/refund", post(admin_refund_order))
        .route("/admin/support/threads", get(admin_list_threads))
        .route("/admin/support/threads/{id}", get(admin_get_thread))
        .route("/admin/support/threads/{id}/close", post(admin_close_thread))
        .route("/admin/support/threads/{id}/messages", post(admin_post_message))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&shared),
            record_request,
        ))
        .with_state(shared)
}

/// A running mock backend. Stops when dropped.
pub struct MockBackend {
    addr: SocketAddr,
    shared: Shared,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend seeded with [`USER_EMAIL`], [`ADMIN_EMAIL`] and
    /// products A, B, C.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let shared: Shared = Arc::new(Mutex::new(Db::seeded()));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Failed to read bound address");

        let app = router(Arc::clone(&shared));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            shared,
            server,
        }
    }

    /// Base URL of the backend.
    ///
    /// # Panics
    ///
    /// Never in practice: the address is a bound socket.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Mock backend URL is valid")
    }

    /// Storefront configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(self.url())
    }

    /// A storefront on a fresh, empty device.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_with_store(MemoryStore::shared())
    }

    /// A storefront on the given device store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn storefront_with_store(&self, store: SharedStore) -> Storefront {
        Storefront::with_store(&self.config(), store).expect("Failed to build storefront")
    }

    fn db(&self) -> MutexGuard<'_, Db> {
        lock(&self.shared)
    }

    /// Make `GET /auth/me` answer `status` from now on.
    pub fn fail_profile_with(&self, status: StatusCode) {
        self.db().profile_failure = Some(status);
    }

    /// Make `GET /auth/me` work again.
    pub fn restore_profile(&self) {
        self.db().profile_failure = None;
    }

    /// Refuse every `POST /cart/add` for `product_id`.
    pub fn reject_product(&self, product_id: &str) {
        self.db().rejected_products.insert(product_id.to_string());
    }

    /// Invalidate every issued token, as after a server-side expiry.
    pub fn revoke_tokens(&self) {
        self.db().tokens.clear();
    }

    /// Number of live tokens.
    #[must_use]
    pub fn live_tokens(&self) -> usize {
        self.db().tokens.len()
    }

    /// Server cart of a user, `product_id -> quantity`.
    #[must_use]
    pub fn server_cart(&self, email: &str) -> BTreeMap<String, u32> {
        self.db().carts.get(email).cloned().unwrap_or_default()
    }

    /// Put lines in a user's server cart directly.
    pub fn seed_server_cart(&self, email: &str, lines: &[(&str, u32)]) {
        let mut db = self.db();
        let cart = db.carts.entry(email.to_string()).or_default();
        for (product_id, quantity) in lines {
            cart.insert((*product_id).to_string(), *quantity);
        }
    }

    /// Stock of a product.
    #[must_use]
    pub fn stock(&self, product_id: &str) -> Option<i64> {
        self.db()
            .products
            .get(product_id)
            .map(|product| product.stock_qty)
    }

    /// Mark an order shipped with a tracking number.
    pub fn ship_order(&self, order_id: &str, carrier: &str, tracking_number: &str) {
        let mut db = self.db();
        if let Some(order) = db.orders.iter_mut().find(|order| order.id == order_id) {
            order.status = "EXPEDIEE";
            order.delivery = Some(json!({
                "transporteur": carrier,
                "tracking_number": tracking_number,
                "delivery_status": "EN_COURS",
            }));
        }
    }

    /// Post a reply from the support team to a thread.
    pub fn support_reply(&self, thread_id: &str, content: &str) {
        let mut db = self.db();
        let message_id = db.next_id("m");
        let now = db.now();
        if let Some(thread) = db.threads.iter_mut().find(|thread| thread.id == thread_id) {
            thread.messages.push(json!({
                "id": message_id,
                "thread_id": thread.id,
                "author_user_id": null,
                "author_name": "Service client",
                "content": content,
                "created_at": now,
            }));
            thread.unread += 1;
        }
    }

    /// Every request received so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.db().requests.clone()
    }

    /// How many requests matched `"METHOD /path"` exactly.
    #[must_use]
    pub fn count(&self, request: &str) -> usize {
        self.db()
            .requests
            .iter()
            .filter(|seen| seen.as_str() == request)
            .count()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.db().requests.clear();
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}
