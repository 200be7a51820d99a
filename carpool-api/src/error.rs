use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use carpool_core::CoreError;
use serde_json::json;

/// Every business failure is answered with HTTP 200 and a discriminant body the
/// frontend branches on. Only faults outside the business rules become 500.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// `{success: false, error}`
    #[error(transparent)]
    Rejected(CoreError),
    /// `{<key>: [], error}` for the listing endpoints.
    #[error("{key}: {error}")]
    EmptyListing { key: &'static str, error: CoreError },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn listing(key: &'static str) -> impl Fn(CoreError) -> AppError {
        move |error| AppError::EmptyListing { key, error }
    }
}

fn log(err: &CoreError) {
    match err {
        CoreError::PersistenceError(detail) => tracing::error!("Request failed on storage: {}", detail),
        other => tracing::debug!("Request rejected: {}", other),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Rejected(err) => {
                log(&err);
                (StatusCode::OK, json!({ "success": false, "error": err.user_message() }))
            }
            AppError::EmptyListing { key, error } => {
                log(&error);
                (StatusCode::OK, json!({ key: [], "error": error.user_message() }))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::Rejected(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Malformed request body: {}", rejection.body_text());
        AppError::Rejected(CoreError::ValidationError("Invalid request body".into()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Malformed query string: {}", rejection.body_text());
        AppError::Rejected(CoreError::ValidationError("Invalid query parameters".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn business_failures_are_200_envelopes() {
        let (status, body) = render(AppError::Rejected(CoreError::Conflict("No seats available".into()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": false, "error": "No seats available" }));
    }

    #[tokio::test]
    async fn listing_failures_keep_an_empty_array() {
        let err = AppError::listing("rides")(CoreError::ValidationError("Date is required".into()));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "rides": [], "error": "Date is required" }));
    }

    #[tokio::test]
    async fn storage_detail_is_hidden() {
        let err = CoreError::PersistenceError("relation \"rides\" does not exist".into());
        let (_, body) = render(AppError::from(err)).await;
        assert_eq!(body["error"], "Database error");
    }

    #[tokio::test]
    async fn internal_errors_are_500() {
        let (status, _) = render(AppError::Internal("boom".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
