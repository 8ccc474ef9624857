use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::{ChangeTypeRequest, CreateSwitchRequest};
use crate::error::ProviderError;
use crate::routes::cookies::CookieContext;
use crate::state::AppState;
use crate::switches::{validate_switch_name, AttributeBag};

fn internal_error(action: &str, e: ProviderError) -> (StatusCode, String) {
    tracing::error!(error = %e, "failed to {action}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Failed to {action}"),
    )
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Switch not found".to_string())
}

/// Create a new switch
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateSwitchRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_switch_name(&payload.name).map_err(|e| (StatusCode::BAD_REQUEST, e))?;

    let types = state.switchboard.types();
    let feature_type = payload
        .feature_type
        .as_deref()
        .unwrap_or(types.default_type());

    let mut switch = types.create(feature_type, &payload.name).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("Unknown feature type '{}'", feature_type),
        )
    })?;
    switch.set_enabled(payload.is_enabled.unwrap_or(false));
    switch.set_custom_attributes(&payload.attributes);

    match state
        .switchboard
        .create(switch.as_ref())
        .await
        .map_err(|e| internal_error("create switch", e))?
    {
        Some(record) => Ok((StatusCode::CREATED, Json(record))),
        None => Err((
            StatusCode::CONFLICT,
            "Switch name already exists".to_string(),
        )),
    }
}

/// List all switches
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, (StatusCode, String)> {
    let switches = state
        .switchboard
        .all()
        .await
        .map_err(|e| internal_error("fetch switches", e))?;

    Ok(Json(switches))
}

/// Get a single switch by name
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .switchboard
        .get(&name)
        .await
        .map_err(|e| internal_error("fetch switch", e))?
    {
        Some(record) => Ok(Json(record)),
        None => Err(not_found()),
    }
}

/// Toggle a switch's enabled state
pub async fn toggle(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .switchboard
        .toggle(&name)
        .await
        .map_err(|e| internal_error("toggle switch", e))?
    {
        Some(record) => Ok(Json(record)),
        None => Err(not_found()),
    }
}

/// Apply type-specific attributes to a switch
pub async fn configure(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<AttributeBag>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .switchboard
        .configure(&name, &payload)
        .await
        .map_err(|e| internal_error("configure switch", e))?
    {
        Some(record) => Ok(Json(record)),
        None => Err(not_found()),
    }
}

/// Change the type of a switch
pub async fn change_type(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<ChangeTypeRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match state
        .switchboard
        .change_type(&name, &payload.feature_type)
        .await
    {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(not_found()),
        Err(ProviderError::UnknownFeatureType { feature_type, .. }) => Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Unknown feature type '{}', expected one of: {}",
                feature_type,
                state.switchboard.types().feature_types().collect::<Vec<_>>().join(", ")
            ),
        )),
        Err(e) => Err(internal_error("change switch type", e)),
    }
}

/// Evaluate a switch for the calling client, persisting sticky decisions as cookies
pub async fn evaluate(
    State(state): State<AppState>,
    Path(name): Path<String>,
    mut cookies: CookieContext,
) -> impl IntoResponse {
    let evaluation = state.switchboard.evaluate(&name, &mut cookies).await;

    (cookies.set_cookie_headers(&state.cookies), Json(evaluation))
}
