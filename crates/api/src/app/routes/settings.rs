use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use vaultbank_core::SettingsPatch;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/", get(get_settings).patch(update_settings))
}

pub async fn get_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    match services.ledger.settings(principal.user_id()).await {
        Ok(settings) => (StatusCode::OK, Json(dto::settings_to_json(&settings))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn update_settings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::UpdateSettingsRequest>,
) -> axum::response::Response {
    let patch = SettingsPatch {
        payment_alerts: body.payment_alerts,
        exchange_alerts: body.exchange_alerts,
        login_alerts: body.login_alerts,
        two_factor: body.two_factor,
    };

    match services.ledger.update_settings(principal.user_id(), patch).await {
        Ok(settings) => (StatusCode::OK, Json(dto::settings_to_json(&settings))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
