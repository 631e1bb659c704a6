//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use skillbridge_app::router::RouteError;

/// Fixed diagnostic returned for every undispatchable request.
const DISPATCH_FAILURE: &str = "Something went wrong";

/// JSON error body returned by the directive endpoint.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// A request that never reached a handler.
///
/// Every variant maps to `400 Bad Request` with the same message; the cause
/// is only logged.
#[derive(Debug)]
pub enum ApiError {
    /// The body is not a JSON document.
    Body(JsonRejection),
    /// The document is not a dispatchable directive.
    Route(RouteError),
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        Self::Body(err)
    }
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        Self::Route(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Body(err) => tracing::warn!(error = %err, "unreadable directive body"),
            Self::Route(err) => {
                let cause = std::error::Error::source(err)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                tracing::warn!(%cause, "undispatchable directive");
            }
        }

        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: DISPATCH_FAILURE,
            }),
        )
            .into_response()
    }
}
