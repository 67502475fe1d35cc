//! Core types for Boutique.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod price;
pub mod session;
pub mod status;

pub use cart::{Cart, CartLine};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use session::{Session, UserProfile};
pub use status::*;
