//! Main Gateway implementation

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use techwise_core::input::validate_query;
use techwise_core::report::to_human_report;
use techwise_core::{
    Advisor, PlannerConfig, PlanningResult, RequirementPlanner, SerializedGenerator,
    TextGenerator, TokenCounter,
};

use crate::config::GatewayConfig;
use crate::{GatewayError, Result};

/// Body of `POST /plan`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    pub question: String,
}

/// Response of `POST /plan`: the structured result plus its text rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub result: PlanningResult,
    pub report: String,
}

/// Body of `POST /ask`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AskRequest {
    pub question: String,
    /// Optional background, e.g. a summary of related documentation
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Gateway state shared across handlers
#[derive(Debug, Clone)]
pub struct GatewayState {
    pub config: GatewayConfig,
    pub planner: RequirementPlanner,
    pub advisor: Advisor,
}

impl GatewayState {
    /// Every request shares `oracle`; it is wrapped so generations never overlap
    pub fn new(
        config: GatewayConfig,
        oracle: Arc<dyn TextGenerator>,
        tokens: Arc<dyn TokenCounter>,
        planner_config: PlannerConfig,
    ) -> Self {
        let oracle: Arc<dyn TextGenerator> = Arc::new(SerializedGenerator::new(oracle));

        Self {
            config,
            planner: RequirementPlanner::new(oracle.clone(), tokens, planner_config.clone()),
            advisor: Advisor::new(oracle, planner_config),
        }
    }
}

/// Main Gateway
#[derive(Debug)]
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    pub fn new(state: GatewayState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Get gateway state
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/", get(Self::handle_index))
            .route("/health", get(Self::handle_health))
            .route("/plan", post(Self::handle_plan))
            .route("/ask", post(Self::handle_ask));

        let router = if self.state.config.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        };

        router
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(self.state.clone())
    }

    /// Start the gateway server; returns after Ctrl+C
    pub async fn start(&self) -> Result<()> {
        let addr = self.state.config.socket_addr()?;
        let router = self.build_router();

        tracing::info!("TechWISE Gateway starting on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    // HTTP handlers

    async fn handle_index() -> Html<&'static str> {
        Html(include_str!("../static/index.html"))
    }

    async fn handle_health() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "healthy",
            "version": crate::VERSION
        }))
    }

    async fn handle_plan(
        State(state): State<Arc<GatewayState>>,
        Json(request): Json<PlanRequest>,
    ) -> Result<Json<PlanResponse>> {
        let question = validate_query(&request.question, state.config.min_query_chars)?;
        tracing::info!("Plan request ({} chars)", question.chars().count());

        let result = state.planner.plan_and_generate(question).await;
        let report = to_human_report(&result);

        Ok(Json(PlanResponse { result, report }))
    }

    async fn handle_ask(
        State(state): State<Arc<GatewayState>>,
        Json(request): Json<AskRequest>,
    ) -> Result<Json<AskResponse>> {
        let question = validate_query(&request.question, state.config.min_query_chars)?;
        tracing::info!("Advice request ({} chars)", question.chars().count());

        let answer = state
            .advisor
            .generate_advice(question, request.context.trim())
            .await;

        Ok(Json(AskResponse { answer }))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Gateway shutdown initiated");
}
