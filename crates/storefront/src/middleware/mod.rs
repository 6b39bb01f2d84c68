//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for scripts)
//! 5. Security headers (CSP with the nonce and media origin, etc.)
//! 6. Session layer (tower-sessions, in-memory store)
//! 7. Rate limiting (governor) on auth and form-action routes

pub mod auth;
pub mod csp;
pub mod layout;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, RequireAuth};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use layout::{Layout, PlayerBar, UserBadge};
pub use rate_limit::{action_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
