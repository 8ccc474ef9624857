use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthData {
    status: u16,
    switches: Option<usize>,
}

/// Reports whether the switch provider answers.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthData>) {
    match state.switchboard.all().await {
        Ok(switches) => (
            StatusCode::OK,
            Json(HealthData {
                status: StatusCode::OK.as_u16(),
                switches: Some(switches.len()),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach provider");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                    switches: None,
                }),
            )
        }
    }
}
