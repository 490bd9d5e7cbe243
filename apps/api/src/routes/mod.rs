pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::pipeline::handlers as pipeline;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Career pathing pipeline
        .route("/api/v1/pipeline", get(pipeline::handle_get_pipeline))
        .route("/api/v1/profile", post(pipeline::handle_submit_profile))
        .route("/api/v1/paths/retry", post(pipeline::handle_retry_paths))
        .route("/api/v1/paths/:id/select", post(pipeline::handle_select_path))
        .route("/api/v1/navigate", post(pipeline::handle_navigate))
        // Chat assistant
        .route(
            "/api/v1/chat/messages",
            get(chat::handle_get_transcript).post(chat::handle_send_message),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::llm_client::ModelGateway;

    fn mock_app() -> Router {
        build_router(AppState::new(Config::default(), ModelGateway::unavailable()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_mock_mode() {
        let response = mock_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mode"], "mock");
    }

    #[tokio::test]
    async fn test_profile_submission_in_mock_mode() {
        let app = mock_app();
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/profile",
                json!({"name": "Meera", "currentRole": "Data Analyst", "aspirationsInput": "Research"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["step"], "paths");
        assert_eq!(body["analysis"]["result"]["extractedSkills"][0], "Mock Skill 1");
        assert_eq!(body["paths"]["result"], json!([]));

        let response = app
            .oneshot(Request::get("/api/v1/pipeline").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["profile"]["name"], "Meera");
    }

    #[tokio::test]
    async fn test_invalid_profile_is_bad_request() {
        let response = mock_app()
            .oneshot(post_json("/api/v1/profile", json!({"name": "Meera"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_selecting_unknown_path_is_not_found() {
        let response = mock_app()
            .oneshot(post_json("/api/v1/paths/missing/select", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_navigate_is_gated() {
        let response = mock_app()
            .oneshot(post_json("/api/v1/navigate", json!({"step": "dashboard"})))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["step"], "profile");
    }

    #[tokio::test]
    async fn test_chat_streams_fragments_as_sse() {
        let app = mock_app();
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/chat/messages", json!({"message": "Hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("event: fragment"));
        assert!(text.contains(r#"data: {"text":"Mock response to: Hello"}"#));
        assert!(text.trim_end().ends_with("data: [DONE]"));

        let response = app
            .oneshot(Request::get("/api/v1/chat/messages").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["mode"], "mock");
        assert_eq!(body["messages"][0]["sender"], "system");
        assert_eq!(body["messages"][2]["text"], "Mock response to: Hello");
    }

    #[tokio::test]
    async fn test_blank_chat_message_is_bad_request() {
        let response = mock_app()
            .oneshot(post_json("/api/v1/chat/messages", json!({"message": " "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
