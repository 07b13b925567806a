//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP context)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (record on span, echo in response)
//! 4. CORS
//! 5. Timeout (408 after the configured duration)
//! 6. Access middleware, on protected routers only
//! 7. Admin check, on admin routes only

pub mod auth;
pub mod request_id;

pub use auth::{RequireAuth, authenticate, extract_token, require_admin};
pub use request_id::request_id_middleware;
