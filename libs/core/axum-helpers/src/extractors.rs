//! JSON extractor producing the shared error body on rejection.

use crate::errors::ErrorResponse;
use axum::{
    extract::{FromRequest, Json, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

/// JSON body extractor.
///
/// Behaves like [`axum::Json`], but any rejection (missing or wrong
/// content type, unreadable body, malformed JSON) is rendered as
/// `400 {"status": false, "message": "Invalid request format"}` instead of
/// axum's plain-text rejection.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::ApiJson;
///
/// async fn create_user(ApiJson(payload): ApiJson<CreateUser>) { /* ... */ }
/// ```
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(data)) => Ok(ApiJson(data)),
            Err(rejection) => {
                tracing::info!("JSON extraction failed: {}", rejection.body_text());
                Err((
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse::new("Invalid request format")),
                )
                    .into_response())
            }
        }
    }
}
