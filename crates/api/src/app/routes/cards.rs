use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use vaultbank_core::CardId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_cards).post(create_card))
        .route("/:id/freeze", patch(freeze_card))
}

pub async fn list_cards(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.ledger.cards(principal.user_id()).await {
        Ok(cards) => {
            let items: Vec<_> = cards.iter().map(dto::card_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn create_card(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateCardRequest>,
) -> axum::response::Response {
    match services
        .ledger
        .issue_card(principal.user_id(), body.account_id, body.name)
        .await
    {
        Ok(card) => (StatusCode::CREATED, Json(dto::card_to_json(&card))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// PATCH /cards/:id/freeze — an unauthorized freeze reads as not-found.
pub async fn freeze_card(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::FreezeCardRequest>,
) -> axum::response::Response {
    let card_id: CardId = match id.parse() {
        Ok(id) => id,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid card id"),
    };

    match services
        .ledger
        .set_card_frozen(principal.user_id(), card_id, body.is_frozen)
        .await
    {
        Ok(card) => (StatusCode::OK, Json(dto::card_to_json(&card))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
