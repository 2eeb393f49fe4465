//! Admin routes.
//!
//! Every handler delegates the gate to the admin desk: the caller's
//! authenticated username must equal the reserved admin literal, and any
//! other identity gets the same generic 403.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use vaultbank_core::UserId;
use vaultbank_ledger::StatusAction;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/status", patch(update_status))
        .route("/transfer", post(transfer))
}

/// GET /admin/users — the roster with derived tier/risk, minus the admin
/// identity itself.
pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.admin.roster(principal.username()).await {
        Ok(roster) => {
            let items: Vec<_> = roster.iter().map(dto::insight_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// PATCH /admin/users/:id/status — persist the status mapped from the
/// action label.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStatusRequest>,
) -> axum::response::Response {
    let user_id: UserId = match id.parse() {
        Ok(id) => id,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };

    let Some(action) = StatusAction::parse(&body.action) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_action",
            "action must be one of: suspend, activate, freeze",
        );
    };

    match services
        .admin
        .update_status(principal.username(), user_id, action)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// POST /admin/transfer — out-of-band credit/debit against the target's
/// first account.
pub async fn transfer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::AdminTransferRequest>,
) -> axum::response::Response {
    let reason = body.reason.unwrap_or_default();

    match services
        .admin
        .transfer(principal.username(), body.user_id, body.amount, &reason)
        .await
    {
        Ok((account, transaction)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "account": dto::account_to_json(&account),
                "transaction": dto::transaction_to_json(&transaction),
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
