use std::any::Any;
use axum::{
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    Router,
};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod extract;
pub mod health;
pub mod rides;
pub mod state;

pub use error::AppError;
pub use state::AppState;

/// `{success: true}`
#[derive(Debug, Serialize)]
pub struct Ack {
    success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

pub fn app(state: AppState, allowed_origin: HeaderValue) -> Router {
    // Only the campus frontend may call the API from a browser
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(auth::routes())
        .merge(rides::routes())
        .merge(bookings::routes())
        .merge(health::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::Internal(format!("Handler panicked: {}", detail)).into_response()
}
