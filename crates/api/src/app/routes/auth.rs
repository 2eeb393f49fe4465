//! Registration, login, and the current-user lookup.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use vaultbank_auth::TokenAuthority;
use vaultbank_core::NewUserProfile;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

/// POST /auth/register — create the user plus their starter bundle, then
/// hand back a fresh token.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tokens): Extension<Arc<dyn TokenAuthority>>,
    Json(body): Json<dto::RegisterRequest>,
) -> axum::response::Response {
    let (Some(username), Some(password), Some(full_name)) =
        (body.username, body.password, body.full_name)
    else {
        return missing_fields();
    };
    if username.trim().is_empty() || password.is_empty() || full_name.trim().is_empty() {
        return missing_fields();
    }

    let password_hash = match vaultbank_auth::hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing failed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_error",
                "internal error",
            );
        }
    };

    let provisioned = match services
        .ledger
        .register(NewUserProfile {
            username,
            password_hash,
            full_name,
        })
        .await
    {
        Ok(p) => p,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    let token = match tokens.issue(provisioned.user.id, &provisioned.user.username) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("token issuance failed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "internal error",
            );
        }
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "user": dto::user_to_json(&provisioned.user),
            "token": token,
        })),
    )
        .into_response()
}

/// POST /auth/login — verify credentials and issue a token.
///
/// Unknown username and wrong password are deliberately the same 401.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tokens): Extension<Arc<dyn TokenAuthority>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    let (Some(username), Some(password)) = (body.username, body.password) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "username and password are required",
        );
    };

    let user = match services.ledger.user_by_username(username.trim()).await {
        Ok(user) => user,
        Err(e) => return errors::ledger_error_to_response(e),
    };
    let Some(user) = user else {
        return invalid_credentials();
    };

    match vaultbank_auth::verify_password(&password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(e) => {
            // A digest that cannot be parsed means corrupt data, not a
            // wrong password.
            tracing::error!(user_id = %user.id, "stored digest malformed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "credential_error",
                "internal error",
            );
        }
    }

    let token = match tokens.issue(user.id, &user.username) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("token issuance failed: {e}");
            return errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "internal error",
            );
        }
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "user": dto::user_to_json(&user),
            "token": token,
        })),
    )
        .into_response()
}

/// GET /auth/user — the authenticated user's profile, sans password hash.
pub async fn current_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.ledger.user(principal.user_id()).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

fn missing_fields() -> axum::response::Response {
    errors::json_error(
        StatusCode::BAD_REQUEST,
        "validation_error",
        "username, password and full_name are required",
    )
}

fn invalid_credentials() -> axum::response::Response {
    errors::json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid credentials")
}
