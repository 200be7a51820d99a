use axum::{extract::State, routing::post, Json, Router};
use carpool_core::user::{LoginRequest, RegisterRequest, UserProfile};
use serde::Serialize;
use crate::{error::AppError, extract::JsonBody, state::AppState, Ack};

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    user: UserProfile,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<Json<Ack>, AppError> {
    state.credentials.register(req).await?;
    Ok(Json(Ack::ok()))
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state.credentials.login(req).await?;
    Ok(Json(LoginResponse { success: true, user }))
}
