//! ProffMusic Core - shared types library.
//!
//! This crate provides the domain types used by the ProffMusic storefront:
//! - catalog records as returned by the remote music API
//! - the shopping cart and its deduplication rules
//! - the audio preview player state machine
//! - catalog filter query parsing and link building
//! - checkout and payment notification payloads
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients, no sessions. The storefront persists these values and
//! talks to the API; everything here is plain data that can be unit tested.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod filter;
pub mod player;
pub mod types;

pub use account::{OrderSummary, TokenPair, User};
pub use cart::{Cart, CartItem, ItemKind, ItemRef};
pub use catalog::{Category, Collection, Listing, Tag, TagGroups, TagType, Track};
pub use checkout::{CheckoutRequest, CheckoutResponse, PaymentNotification};
pub use filter::CatalogFilter;
pub use player::{Player, PlayerTrack};
pub use types::*;
