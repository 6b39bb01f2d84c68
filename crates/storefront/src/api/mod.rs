//! Client for the ProffMusic REST API.
//!
//! # Architecture
//!
//! - The API is the source of truth for catalog, accounts and orders; the
//!   storefront keeps no copy beyond a short-lived cache
//! - In-memory caching via `moka` for catalog reads (configurable TTL)
//! - Plain JSON over `reqwest`; JWT bearer tokens for account calls
//!
//! # Endpoints
//!
//! | Area | Path |
//! |---|---|
//! | Catalog | `tracks/`, `tracks/{slug}/`, `collections/`, `collections/{slug}/`, `categories/`, `tags/` |
//! | Auth | `auth/jwt/create/`, `auth/jwt/refresh/`, `auth/users/`, `auth/users/me/` |
//! | Account | `users/upload_avatar/`, `users/orders/` |
//! | Orders | `orders/checkout/`, `orders/webhook/` |

mod account;
mod cache;
mod catalog;
mod client;
mod error;
mod orders;

pub use account::AvatarUpload;
pub use client::ApiClient;
pub use error::ApiError;
