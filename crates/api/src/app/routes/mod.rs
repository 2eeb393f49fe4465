use axum::{
    routing::{get, post},
    Router,
};

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod cards;
pub mod exchanges;
pub mod settings;
pub mod system;
pub mod transactions;

/// Router for the unauthenticated endpoints (token issuance).
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/user", get(auth::current_user))
        .nest("/accounts", accounts::router())
        .nest("/transactions", transactions::router())
        .nest("/cards", cards::router())
        .nest("/exchanges", exchanges::router())
        .nest("/settings", settings::router())
        .nest("/admin", admin::router())
}
