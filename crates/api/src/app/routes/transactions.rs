use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use vaultbank_ledger::TransactionRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(list_transactions).post(create_transaction))
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.ledger.transactions(principal.user_id()).await {
        Ok(transactions) => {
            let items: Vec<_> = transactions.iter().map(dto::transaction_to_json).collect();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

/// POST /transactions — one balance move, one journal row, atomically.
pub async fn create_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateTransactionRequest>,
) -> axum::response::Response {
    match services
        .ledger
        .record_transaction(
            principal.user_id(),
            TransactionRequest {
                account_id: body.account_id,
                amount: body.amount,
                name: body.name,
                category: body.category,
            },
        )
        .await
    {
        Ok((account, transaction)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "transaction": dto::transaction_to_json(&transaction),
                "account": dto::account_to_json(&account),
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
