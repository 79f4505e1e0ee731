//! HTTP middleware and extractors for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span and the Sentry scope)
//! 4. CORS (any origin)

pub mod auth;
pub mod request_id;

pub use auth::BearerUser;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
