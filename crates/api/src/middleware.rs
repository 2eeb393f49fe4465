use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use vaultbank_auth::TokenAuthority;

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenAuthority>,
}

/// Resolve the bearer token into a [`PrincipalContext`] request extension.
///
/// Missing header, malformed token, bad signature, and expiry are all the
/// same generic 401; no cause is surfaced to the caller.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(resp) => return resp,
    };

    let claims = match state.tokens.validate(token) {
        Ok(claims) => claims,
        Err(_) => return unauthenticated(),
    };

    req.extensions_mut()
        .insert(PrincipalContext::new(claims.sub, claims.username));

    next.run(req).await
}

fn unauthenticated() -> Response {
    errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "not authenticated")
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(unauthenticated)?;

    let header = header.to_str().map_err(|_| unauthenticated())?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(unauthenticated)?
        .trim();

    if token.is_empty() {
        return Err(unauthenticated());
    }

    Ok(token)
}
