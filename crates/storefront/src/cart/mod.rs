//! Cart handling.
//!
//! Two carts exist and exactly one is authoritative at a time:
//!
//! - [`LocalCart`] - device storage, used while anonymous
//! - [`ServerCart`] - the backend's per-user cart, used once logged in
//!
//! [`reconcile`] moves the local cart into the server cart right after login,
//! and [`ActiveCart`] picks the right cart for the current session so callers
//! never have to.

mod active;
mod local;
mod reconcile;
mod server;

pub use active::ActiveCart;
pub use local::LocalCart;
pub use reconcile::{CartSink, ReconcileResult, reconcile};
pub use server::ServerCart;
