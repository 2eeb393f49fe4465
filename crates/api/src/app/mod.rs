//! HTTP application wiring (axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: store selection (in-memory vs Postgres) + ledger wiring
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use vaultbank_auth::{Hs256Tokens, TokenAuthority};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(jwt_secret: String) -> Router {
    let tokens: Arc<dyn TokenAuthority> = Arc::new(Hs256Tokens::new(jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState {
        tokens: tokens.clone(),
    };

    let services = Arc::new(services::build_services().await);

    // Registration and login issue tokens and take no bearer header.
    let public = routes::public_router()
        .layer(Extension(services.clone()))
        .layer(Extension(tokens));

    // Everything else requires an authenticated principal.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(public)
        .merge(protected)
}
