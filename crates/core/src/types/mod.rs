//! Core types for ProffMusic.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CURRENCY_CODE, CURRENCY_SIGN, Price};
