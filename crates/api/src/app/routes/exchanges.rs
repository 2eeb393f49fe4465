use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use vaultbank_ledger::ExchangeOrder;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_exchanges).post(create_exchange))
}

pub async fn list_exchanges(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.ledger.exchanges(principal.user_id()).await {
        Ok(exchanges) => {
            let items: Vec<_> = exchanges.iter().map(dto::exchange_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// POST /exchanges — both balances move and exactly one exchange row is
/// written, or nothing is.
pub async fn create_exchange(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateExchangeRequest>,
) -> axum::response::Response {
    match services
        .ledger
        .execute_exchange(
            principal.user_id(),
            ExchangeOrder {
                from_currency: body.from_currency,
                to_currency: body.to_currency,
                from_amount: body.from_amount,
                to_amount: body.to_amount,
                rate: body.rate,
            },
        )
        .await
    {
        Ok(exchange) => (StatusCode::CREATED, Json(dto::exchange_to_json(&exchange))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
