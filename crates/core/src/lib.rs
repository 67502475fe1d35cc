//! Boutique Core - Shared types library.
//!
//! This crate provides common types used across all Boutique components:
//! - `storefront` - Client library for the shop backend (auth, carts, orders)
//! - `cli` - Command-line front end over the storefront client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no device storage, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, prices, statuses, the cart model and
//!   the authenticated session

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
