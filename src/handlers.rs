use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

use crate::{
    error::AppResult,
    form::RegistrationForm,
    models::{HealthResponse, RegisterResponse},
    state::AppState,
};

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationForm>, JsonRejection>,
) -> AppResult<Json<RegisterResponse>> {
    let Json(form) = payload?;
    let registration = form.validate().inspect_err(|errors| {
        debug!(fields = errors.len(), "registration rejected by validation");
    })?;

    let record = state.store.append(registration).await?;

    Ok(Json(RegisterResponse {
        message: "Details saved successfully!",
        id: record.id,
    }))
}
