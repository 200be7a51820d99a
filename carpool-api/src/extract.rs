use axum::extract::{FromRequest, FromRequestParts};
use crate::error::AppError;

/// `axum::Json` with malformed bodies answered in the business envelope instead
/// of a plain-text 4xx.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Query` with the same rejection treatment.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
