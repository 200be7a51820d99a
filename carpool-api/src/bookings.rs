use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use carpool_core::booking::{BookingRequest, RiderBookingView, SeaterBookingView};
use carpool_core::validate::parse_id;
use carpool_core::CoreResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::{
    error::AppError,
    extract::{JsonBody, QueryParams},
    state::AppState,
    Ack,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingAction {
    booking_id: Option<String>,
}

impl BookingAction {
    fn id(self) -> CoreResult<Uuid> {
        parse_id(self.booking_id, "bookingId", "Booking")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentParams {
    student_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct BookingsResponse<T> {
    bookings: Vec<T>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/confirm-booking", post(confirm_booking))
        .route("/accept-booking", post(accept_booking))
        .route("/reject-booking", post(reject_booking))
        .route("/cancel-booking", post(cancel_booking))
        .route("/rider-bookings", get(rider_bookings))
        .route("/seater-bookings", get(seater_bookings))
}

async fn confirm_booking(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<BookingRequest>,
) -> Result<Json<Ack>, AppError> {
    state.bookings.request_booking(req).await?;
    Ok(Json(Ack::ok()))
}

async fn accept_booking(
    State(state): State<AppState>,
    JsonBody(action): JsonBody<BookingAction>,
) -> Result<Json<Ack>, AppError> {
    state.bookings.accept_booking(action.id()?).await?;
    Ok(Json(Ack::ok()))
}

async fn reject_booking(
    State(state): State<AppState>,
    JsonBody(action): JsonBody<BookingAction>,
) -> Result<Json<Ack>, AppError> {
    state.bookings.reject_booking(action.id()?).await?;
    Ok(Json(Ack::ok()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    JsonBody(action): JsonBody<BookingAction>,
) -> Result<Json<Ack>, AppError> {
    state.bookings.cancel_booking(action.id()?).await?;
    Ok(Json(Ack::ok()))
}

async fn rider_bookings(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<StudentParams>,
) -> Result<Json<BookingsResponse<RiderBookingView>>, AppError> {
    let bookings = state
        .listing
        .bookings_for_rider(params.student_id)
        .await
        .map_err(AppError::listing("bookings"))?;
    Ok(Json(BookingsResponse { bookings }))
}

async fn seater_bookings(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<StudentParams>,
) -> Result<Json<BookingsResponse<SeaterBookingView>>, AppError> {
    let bookings = state
        .listing
        .bookings_for_seater(params.student_id)
        .await
        .map_err(AppError::listing("bookings"))?;
    Ok(Json(BookingsResponse { bookings }))
}
