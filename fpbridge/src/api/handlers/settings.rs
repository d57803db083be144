//! HTTP handlers for the bridge settings.

use axum::{Json, extract::State};

use crate::{
    AppState,
    api::models::settings::SettingsResponse,
    auth::AdminToken,
    errors::Result,
    settings::SettingsUpdate,
};

#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    summary = "Get settings",
    description = "Get the webhook URL and revisions page the page-load trigger uses",
    responses(
        (status = 200, description = "Current settings", body = SettingsResponse),
        (status = 401, description = "Missing or invalid admin token"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_settings(State(state): State<AppState>, _admin: AdminToken) -> Json<SettingsResponse> {
    let settings = state.settings.snapshot();
    Json(SettingsResponse::from(settings.as_ref()))
}

#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    summary = "Save settings",
    description = "Sanitise and save the settings. The webhook URL defaults to `http://` when no scheme is given \
and an empty value clears it. The revisions page accepts a number or numeric string; 0 or empty clears it. \
Omitted fields are cleared.",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Settings saved", body = SettingsResponse),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 422, description = "A value could not be sanitised"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_settings(
    State(state): State<AppState>,
    _admin: AdminToken,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>> {
    let saved = state.settings.save(&update)?;
    Ok(Json(SettingsResponse::from(saved.as_ref())))
}
