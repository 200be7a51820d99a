use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use carpool_core::ride::{PostRideRequest, RideSummary};
use serde::{Deserialize, Serialize};
use crate::{
    error::AppError,
    extract::{JsonBody, QueryParams},
    state::AppState,
    Ack,
};

#[derive(Debug, Deserialize)]
struct SearchParams {
    destination: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Serialize)]
struct RidesResponse {
    rides: Vec<RideSummary>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/post-ride", post(post_ride))
        .route("/search-rides", get(search_rides))
}

async fn post_ride(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PostRideRequest>,
) -> Result<Json<Ack>, AppError> {
    state.catalog.post_ride(req).await?;
    Ok(Json(Ack::ok()))
}

async fn search_rides(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<RidesResponse>, AppError> {
    let rides = state
        .catalog
        .search_rides(params.destination, params.date)
        .await
        .map_err(AppError::listing("rides"))?;
    Ok(Json(RidesResponse { rides }))
}
