//! Router-level tests with a scripted oracle

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use techwise_core::{
    GenerationParams, OracleError, PlannerConfig, TextGenerator, WhitespaceTokenCounter,
};
use techwise_gateway::{Gateway, GatewayConfig, GatewayState};
use tower::ServiceExt;

/// Answers the plan stages with JSON and advice prompts with prose
#[derive(Debug)]
struct HelpdeskOracle;

#[async_trait::async_trait]
impl TextGenerator for HelpdeskOracle {
    fn name(&self) -> &str {
        "helpdesk"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, OracleError> {
        let out = if prompt.starts_with("You are a requirements extractor") {
            r#"{"problem_summary": "Shared drive not mapping at login", "os": "Windows 11"}"#
                .to_string()
        } else if prompt.starts_with("You are a senior systems engineer") {
            r#"{"confidence": 8, "steps": [{"id": 1, "title": "Check group policy", "description": "Run gpresult", "risk": "low", "estimated_minutes": 5}]}"#
                .to_string()
        } else if prompt.starts_with("You are TechWISE Advisor. Expand") {
            r#"{"guide": "Open an elevated prompt and run gpresult /r.", "commands": ["gpresult /r"], "verification": "Drive mapping policy is listed", "rollback": "Nothing to revert"}"#
                .to_string()
        } else {
            "Goal: stand up a helpdesk ticketing portal for the office. Recommended Tech Stack: \
             a hosted ticketing product with single sign-on. Step-by-Step Plan: inventory request \
             types, configure queues, import users, train staff and announce the portal. Testing \
             & Deployment: pilot the helpdesk with one team for two weeks. Notes & Reasoning: \
             buying beats building for a small office helpdesk."
                .to_string()
        };
        Ok(out)
    }
}

fn router() -> axum::Router {
    let state = GatewayState::new(
        GatewayConfig::default(),
        Arc::new(HelpdeskOracle),
        Arc::new(WhitespaceTokenCounter),
        PlannerConfig::default(),
    );
    Gateway::new(state).build_router()
}

async fn post_json(path: &str, body: Value) -> (StatusCode, Value) {
    let response = router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
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
    let response = router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_index_serves_form() {
    let response = router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("<textarea id=\"question\""));
}

#[tokio::test]
async fn test_plan_route() {
    let (status, body) = post_json(
        "/plan",
        json!({"question": "Shared drive does not map when I log in"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requirements"]["os"], "Windows 11");
    assert_eq!(body["plan"]["confidence"], 8);
    assert_eq!(body["expanded_steps"][0]["title"], "Check group policy");
    assert_eq!(body["expanded_steps"][0]["commands"][0], "gpresult /r");
    assert!(body["report"]
        .as_str()
        .unwrap()
        .contains("1. Check group policy  (risk: low, ~5m)"));
}

#[tokio::test]
async fn test_plan_route_rejects_empty_question() {
    let (status, body) = post_json("/plan", json!({"question": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter your IT-related question.");

    let (status, _) = post_json("/plan", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_route() {
    let (status, body) = post_json(
        "/ask",
        json!({"question": "How should we run a helpdesk for a small office?", "context": ""}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().starts_with("Goal: stand up a helpdesk"));
}

#[tokio::test]
async fn test_ask_route_rejects_short_question() {
    let (status, body) = post_json("/ask", json!({"question": "hi"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 3 characters"));
}

