//! JSON handler for directives.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde_json::Value;

use skillbridge_app::ports::{Backend, ScheduleStore};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /directive`: dispatch one directive and return its event.
///
/// Error events are a successful exchange: the voice assistant reads the
/// failure from the event itself.
pub async fn dispatch<B, S>(
    State(state): State<AppState<B, S>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    B: Backend + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
{
    let Json(raw) = body?;
    let event = state.router.dispatch(raw).await?;
    Ok(Json(event.to_wire()))
}
