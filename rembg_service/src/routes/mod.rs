mod health;
mod info;
mod remove_background;

use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub use remove_background::{INPUT_SIZE_HEADER, OUTPUT_SIZE_HEADER, PROCESSING_TIME_HEADER};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(info::info))
        .route("/health", get(health::healthcheck))
        .route(
            "/remove-background",
            post(remove_background::remove_background),
        )
}

#[cfg(test)]
mod tests {
    use crate::{mocks::MockModelService, server::build_router, state::SharedState};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        build_router(SharedState::new(MockModelService::new()), 1024 * 1024)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let (status, body) = get_json(router(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({"status": "ok", "model": "mock-u2netp"})
        );
    }

    #[tokio::test]
    async fn test_healthcheck_after_failed_request() {
        let router = build_router(SharedState::new(MockModelService::failing()), 1024 * 1024);
        let request = Request::builder()
            .method("POST")
            .uri("/remove-background")
            .body(Body::empty())
            .unwrap();
        router.clone().oneshot(request).await.unwrap();

        let (status, body) = get_json(router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_info() {
        let (status, body) = get_json(router(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "rembg-api");
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["model"], "mock-u2netp");
        assert_eq!(body["endpoints"]["/health"], "GET - Health check");
        assert!(body["endpoints"]["/remove-background"]
            .as_str()
            .unwrap()
            .starts_with("POST"));
    }
}
