//! Emporium API library.
//!
//! Accounts, catalog, carts and orders over JSON/HTTP. The crate is a
//! library so the router can be driven in-process by tests; the
//! `emporium-api` binary wires it to `PostgreSQL` and a TCP listener.
//!
//! # Request flow
//!
//! ```text
//! request -> Sentry -> Trace -> Request ID -> CORS -> Timeout
//!         -> access middleware (protected routes) -> handler
//!         -> validation -> Store -> JSON response
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, Method, Request, header},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Build the complete application router with its middleware stack.
///
/// Sentry layers are added by the binary, outside this stack, so that
/// tests don't need a Sentry hub.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config());
    let timeout = TimeoutLayer::new(state.config().request_timeout);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
            )
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    routes::routes(&state)
        .with_state(state)
        .layer(timeout)
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(trace)
}

/// CORS policy: any origin unless `EMPORIUM_CORS_ORIGINS` lists some.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(middleware::auth::TOKEN_HEADER),
        ]);

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}
