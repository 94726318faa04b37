pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::refinement::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/validate", post(handlers::handle_validate))
        .route("/api/v1/refine", post(handlers::handle_refine))
        .route("/api/v1/refine/upload", post(handlers::handle_refine_upload))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::ingest::InputProcessor;
    use crate::pipeline::output::OutputWriter;
    use crate::pipeline::RefinementPipeline;
    use crate::refinement::engine::RuleBasedRefiner;
    use crate::refinement::rules::RuleSet;

    fn test_router(out: &Path) -> Router {
        let rules = Arc::new(RuleSet::default());
        let pipeline = RefinementPipeline::new(
            InputProcessor::new("tesseract", Duration::from_secs(5)),
            Arc::new(RuleBasedRefiner::new(rules.clone())),
            rules.clone(),
            OutputWriter::new(out),
        );
        build_router(AppState {
            rules,
            pipeline: Arc::new(pipeline),
        })
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_router(dir.path())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "prompt-refiner");
    }

    #[tokio::test]
    async fn test_validate_rejects_greeting() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            test_router(dir.path()),
            "/api/v1/validate",
            json!({"content": "hi", "input_type": "image"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_relevant"], false);
        assert!(body["reason"].as_str().unwrap().contains("greeting"));
    }

    #[tokio::test]
    async fn test_validate_short_input_reports_length() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            test_router(dir.path()),
            "/api/v1/validate",
            json!({"content": "inventory tracker", "input_type": "text"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_relevant"], false);
        assert!(body["reason"].as_str().unwrap().contains("too short"));
    }

    #[tokio::test]
    async fn test_validate_unknown_input_type_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            test_router(dir.path()),
            "/api/v1/validate",
            json!({"content": "Build a CRM for a dental practice", "input_type": "fax"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
    }

    #[tokio::test]
    async fn test_refine_returns_prompt_and_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            test_router(dir.path()),
            "/api/v1/refine",
            json!({
                "text": "Build a task management web application with user authentication. Must work on mobile.",
                "output_name": "tasks",
                "persist": true
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["prompt"]["domain"], "software_development");
        assert!(body["markdown"]
            .as_str()
            .unwrap()
            .contains("## Functional Requirements"));
        assert!(dir.path().join("tasks.json").exists());
    }

    #[tokio::test]
    async fn test_refine_empty_text_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) =
            post_json(test_router(dir.path()), "/api/v1/refine", json!({"text": ""})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["stage"], "relevance_check");
        assert!(body.get("markdown").is_none());
    }

    #[tokio::test]
    async fn test_upload_text_field() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = "XREFINERBOUNDARY";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"text\"\r\n\r\n\
             Create an expense tracking app with receipt storage and login.\r\n\
             --{boundary}\r\n\
             Content-Disposition: form-data; name=\"notes\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             It must run on Android.\r\n\
             --{boundary}--\r\n"
        );
        let response = test_router(dir.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/refine/upload")
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={boundary}"),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["prompt"]["input_types"], json!(["text"]));
        assert!(body["prompt"]["technical_constraints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["constraint_type"] == "platform" && c["is_mandatory"] == true));
    }
}
