//! Axum router assembly.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use skillbridge_app::ports::{Backend, ScheduleStore};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<B, S>(state: AppState<B, S>) -> Router
where
    B: Backend + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/directive", post(crate::api::dispatch::<B, S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use skillbridge_app::ports::StateSample;
    use skillbridge_app::router::DirectiveRouter;
    use skillbridge_domain::catalog::Catalog;
    use skillbridge_domain::error::BackendError;
    use skillbridge_domain::routing::{BackendKind, BackendPayload, Destination};
    use skillbridge_domain::schedule::Schedule;
    use tower::ServiceExt;

    struct StubBackend {
        calls: AtomicUsize,
    }

    struct NoSchedules;

    impl Backend for StubBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Mqtt
        }

        async fn send(&self, _payload: BackendPayload) -> Result<(), BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn query(&self, _destination: Destination) -> Result<StateSample, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Unsupported("state query"))
        }
    }

    impl ScheduleStore for NoSchedules {
        async fn latest_for_zone(&self, _zone: &str) -> Result<Option<Schedule>, BackendError> {
            Ok(None)
        }
    }

    fn app() -> Router {
        let router = DirectiveRouter::new(
            Catalog::new(vec![json!({"endpointId": "lamp", "friendlyName": "Lamp"})]),
            StubBackend {
                calls: AtomicUsize::new(0),
            },
            NoSchedules,
            Duration::from_secs(1),
        );
        build(AppState::new(router))
    }

    fn post_directive(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/directive")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn should_answer_discovery_with_catalog() {
        let response = app()
            .oneshot(post_directive(&json!({
                "directive": {
                    "header": {
                        "namespace": "Alexa.Discovery",
                        "name": "Discover",
                        "payloadVersion": "3",
                        "messageId": "m-1"
                    },
                    "payload": {}
                }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["event"]["header"]["name"], "Discover.Response");
        assert_eq!(body["event"]["header"]["messageId"], "m-1-R");
        assert_eq!(body["event"]["payload"]["endpoints"][0]["endpointId"], "lamp");
    }

    #[tokio::test]
    async fn should_return_error_event_with_ok_status() {
        let response = app()
            .oneshot(post_directive(&json!({
                "directive": {
                    "header": {
                        "namespace": "Alexa.PowerController",
                        "name": "Toggle",
                        "messageId": "m-2"
                    },
                    "endpoint": {"endpointId": "lamp", "cookie": {"topic": "lamp"}}
                }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = json_body(response).await;
        assert_eq!(body["event"]["header"]["name"], "ErrorResponse");
        assert_eq!(body["event"]["payload"]["type"], "UNSUPPORTED_OPERATION");
    }

    #[tokio::test]
    async fn should_reject_unknown_namespace_with_fixed_message() {
        let response = app()
            .oneshot(post_directive(&json!({
                "header": {
                    "namespace": "Alexa.Speaker",
                    "name": "SetVolume",
                    "messageId": "m-3"
                },
                "payload": {}
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Something went wrong"})
        );
    }

    #[tokio::test]
    async fn should_reject_body_that_is_not_json() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/directive")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Something went wrong"})
        );
    }
}
