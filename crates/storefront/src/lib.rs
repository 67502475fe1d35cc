//! Boutique Storefront client library.
//!
//! Everything a shop front end needs to talk to the Boutique backend:
//! bearer-token authentication, an anonymous device-local cart, the
//! account-bound server cart, the one-time reconciliation between the two
//! at login, and thin clients for the catalog, orders and customer support.
//! Administrator accounts also get a back-office client ([`admin`]).
//!
//! # Architecture
//!
//! - [`Storefront`] is the root context. It owns every component and is
//!   passed explicitly to whatever needs it; there are no globals.
//! - Device-local state (token, anonymous cart) lives behind the
//!   [`storage::KeyValueStore`] trait: a JSON file per key in production,
//!   an in-memory map in tests.
//! - The backend is a plain REST/JSON API reached through [`api::ApiClient`].
//!
//! # Example
//!
//! ```rust,ignore
//! use boutique_storefront::{Storefront, StorefrontConfig, auth::Credentials};
//!
//! let config = StorefrontConfig::from_env()?;
//! let mut shop = Storefront::open(&config)?;
//! shop.restore().await;
//!
//! // Anonymous: goes to the local cart.
//! shop.cart().increment(&"p-1".into()).await?;
//!
//! // Login drains the local cart into the server cart.
//! let outcome = shop.login(&Credentials::new("me@shop.fr", "pw")?).await?;
//! assert!(shop.local_cart().get()?.is_empty());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod orders;
pub mod state;
pub mod storage;
pub mod support;

pub use config::StorefrontConfig;
pub use error::{Error, Result};
pub use state::{LoginOutcome, Storefront};
