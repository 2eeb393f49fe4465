use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use vaultbank_ledger::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        LedgerError::UsernameTaken => {
            json_error(StatusCode::BAD_REQUEST, "username_taken", "username already registered")
        }
        LedgerError::UserNotFound => json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        LedgerError::AccountNotFound => {
            json_error(StatusCode::NOT_FOUND, "not_found", "account not found")
        }
        LedgerError::NoCurrencyAccount(currency) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no {currency} account for user"),
        ),
        LedgerError::InsufficientFunds { available, requested } => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_funds",
            format!("insufficient funds: available {available}, requested {requested}"),
        ),
        LedgerError::CardNotFound => json_error(StatusCode::NOT_FOUND, "not_found", "card not found"),
        LedgerError::AdminRequired => {
            json_error(StatusCode::FORBIDDEN, "forbidden", "admin access required")
        }
        LedgerError::Storage(e) => {
            // Internal detail stays in the logs.
            tracing::error!("storage failure: {e:#}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
