// Axum API Server Module
//
// Purpose: HTTP surface for packaging recommendations (AI pass-through with
// follow-up sessions) and the pouch waste calculator.

use axum::{
    extract::{rejection::FormRejection, rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Form, Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::ai_client::{AiError, GeminiClient, TextGenerator};
use crate::config::ServerConfig;
use crate::conversation::{Conversation, ConversationStore};
use crate::markdown::render_markdown;
use crate::prompts::{
    follow_up_prompt, recommendation_prompt, session_id_for, FollowUpRequest, RecommendationRequest,
};
use crate::waste::{calculate, CalculationError, WasteCalculationRequest};
use crate::web::handlers::pages::index_page;

const SESSION_NOT_FOUND: &str = "Session expired or not found. Please get a new recommendation.";
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub conversations: ConversationStore,
    pub admin_token: Option<Arc<str>>,
    pub static_dir: String,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Initializing Gemini client (model {})...", config.gemini.model);
        if config.gemini.api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; recommendation endpoints will return 503");
        }
        let generator = Arc::new(GeminiClient::new(config.gemini.clone())?);

        tracing::info!(
            "Initializing session cache (capacity {}, ttl {}s)...",
            config.session_capacity,
            config.session_ttl.as_secs()
        );
        let conversations = ConversationStore::new(config.session_capacity, config.session_ttl);

        Ok(Self {
            generator,
            conversations,
            admin_token: config.admin_token.as_deref().map(Arc::from),
            static_dir: config.static_dir.clone(),
        })
    }

    /// State with a caller-supplied generator and no admin token
    pub fn with_generator(generator: Arc<dyn TextGenerator>, conversations: ConversationStore) -> Self {
        Self {
            generator,
            conversations,
            admin_token: None,
            static_dir: "static".to_string(),
        }
    }

    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(Arc::from(token));
        self
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        // Pages
        .route("/", get(index_page))
        .route("/health", get(health_check))

        // Recommendation endpoints (form-encoded)
        .route("/get_recommendation", post(get_recommendation))
        .route("/ask_question", post(ask_question))

        // Waste calculator (JSON)
        .route("/calculate-waste", post(calculate_waste))

        // Administration
        .route("/admin/clear-sessions", post(clear_sessions))

        .nest_service("/static", static_files)

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "sessions": state.conversations.len().await,
    }))
}

async fn calculate_waste(
    payload: Result<Json<WasteCalculationRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let results = calculate(&request).map_err(|e| match e {
        CalculationError::Validation(err) => {
            tracing::info!(field = err.field(), "Rejected waste calculation: {}", err);
            AppError::BadRequest(err.to_string())
        }
        other @ CalculationError::Computation { .. } => {
            tracing::error!("Waste calculation failed: {}", other);
            AppError::Internal(other.to_string())
        }
    })?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": results,
    })))
}

async fn get_recommendation(
    State(state): State<AppState>,
    payload: Result<Form<RecommendationRequest>, FormRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Form(params) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if let Some(field) = params.missing_field() {
        return Err(AppError::BadRequest(format!("Missing required field: {}", field)));
    }

    let session_id = session_id_for(&params);
    let prompt = recommendation_prompt(&params);
    tracing::info!(session_id = %session_id, language = params.language(), "Requesting packaging recommendation");

    let recommendation = state.generator.generate(&prompt).await?;

    state
        .conversations
        .start(session_id.clone(), Conversation::new(params, prompt))
        .await;

    Ok(Json(serde_json::json!({
        "status": "success",
        "recommendation_html": render_markdown(&recommendation),
        "recommendation": recommendation,
        "session_id": session_id,
    })))
}

async fn ask_question(
    State(state): State<AppState>,
    payload: Result<Form<FollowUpRequest>, FormRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Form(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if let Some(field) = request.missing_field() {
        return Err(AppError::BadRequest(format!("Missing required field: {}", field)));
    }

    let session_id = request.session_id.trim();
    let shared = state
        .conversations
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(SESSION_NOT_FOUND.to_string()))?;

    // Held across the provider call so follow-ups on one session stay ordered
    let mut conversation = shared.lock().await;
    let question = request.question.trim();
    let prompt = follow_up_prompt(&conversation, question, request.language.as_deref());
    tracing::info!(session_id = %session_id, "Answering follow-up question");

    let answer = state.generator.generate(&prompt).await?;

    // A new recommendation may have replaced the session meanwhile
    if state.conversations.is_current(session_id, &shared).await {
        conversation.record_exchange(question, &answer);
    } else {
        tracing::warn!(session_id = %session_id, "Session replaced during follow-up; exchange not recorded");
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "answer_html": render_markdown(&answer),
        "answer": answer,
    })))
}

async fn clear_sessions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err(AppError::Forbidden("Session administration is disabled".to_string()));
    };
    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    if provided != Some(expected) {
        return Err(AppError::Forbidden("Invalid admin token".to_string()));
    }

    let cleared = state.conversations.clear().await;
    tracing::info!("Cleared {} conversation sessions", cleared);

    Ok(Json(serde_json::json!({
        "status": "success",
        "cleared": cleared,
    })))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Forbidden(String),
    Upstream(String),
    GatewayTimeout(String),
    Unavailable(String),
    Internal(String),
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        tracing::warn!("AI provider call failed: {}", err);
        match err {
            AiError::MissingApiKey => {
                AppError::Unavailable("The recommendation service is not configured".to_string())
            }
            AiError::Timeout { .. } => AppError::GatewayTimeout(err.to_string()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "status": "error",
            "message": message,
        }));

        (status, body).into_response()
    }
}
