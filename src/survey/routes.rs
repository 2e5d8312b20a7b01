//! REST endpoints for questionnaire sessions, the schema, and facts.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::MutexGuard;

use super::manager::SurveyManager;
use super::model::ChatMessage;
use super::prompts::FACTS;
use super::schema::{FEATURES, FeatureId};
use super::sessions::{SessionStore, SharedSurvey};

/// Shared state for survey routes.
#[derive(Clone)]
pub struct SurveyRouteState {
    pub sessions: Arc<SessionStore>,
}

/// Build the survey REST routes.
pub fn survey_routes(state: SurveyRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/features", get(list_features))
        .route("/api/features/{id}", get(get_feature))
        .route("/api/facts", get(list_facts))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route(
            "/api/sessions/{id}/messages",
            get(list_messages).post(post_message),
        )
        .route("/api/sessions/{id}/start", post(start_session))
        .route("/api/sessions/{id}/restart", post(restart_session))
        .with_state(state)
}

// ── Health & static data ────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "mind-companion"
    }))
}

async fn list_features() -> impl IntoResponse {
    Json(&FEATURES[..])
}

async fn get_feature(Path(id): Path<String>) -> Response {
    match id.parse::<FeatureId>() {
        Ok(feature) => Json(feature.schema()).into_response(),
        Err(e) => error(StatusCode::NOT_FOUND, &e),
    }
}

async fn list_facts() -> impl IntoResponse {
    Json(json!({ "facts": FACTS }))
}

// ── Sessions ────────────────────────────────────────────────────────────

async fn create_session(State(state): State<SurveyRouteState>) -> Response {
    let (id, survey) = state.sessions.create().await;
    let manager = survey.lock().await;
    (
        StatusCode::CREATED,
        Json(json!({
            "session_id": id,
            "phase": manager.phase(),
            "messages": manager.transcript().messages(),
        })),
    )
        .into_response()
}

async fn get_session(State(state): State<SurveyRouteState>, Path(id): Path<String>) -> Response {
    with_session(&state, &id, |manager| {
        let mut body = json!(manager.status());
        body["session_id"] = json!(id);
        Json(body).into_response()
    })
    .await
}

async fn list_messages(State(state): State<SurveyRouteState>, Path(id): Path<String>) -> Response {
    with_session(&state, &id, |manager| {
        Json(json!({ "messages": manager.transcript().messages() })).into_response()
    })
    .await
}

#[derive(Deserialize)]
struct MessageRequest {
    content: String,
}

async fn post_message(
    State(state): State<SurveyRouteState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> Response {
    let content = body.content.trim();
    if content.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Message content is empty");
    }

    let survey = match lookup(&state, &id).await {
        Ok(survey) => survey,
        Err(response) => return response,
    };
    let mut manager = match try_lock(&survey, &id) {
        Ok(manager) => manager,
        Err(response) => return response,
    };

    let replies = manager.handle(content).await;
    tracing::debug!(session_id = %id, phase = %manager.phase(), replies = replies.len(), "Message handled");
    Json(json!({
        "phase": manager.phase(),
        "replies": replies,
    }))
    .into_response()
}

async fn start_session(State(state): State<SurveyRouteState>, Path(id): Path<String>) -> Response {
    control(&state, &id, SurveyManager::begin).await
}

async fn restart_session(State(state): State<SurveyRouteState>, Path(id): Path<String>) -> Response {
    control(&state, &id, SurveyManager::restart).await
}

async fn control(
    state: &SurveyRouteState,
    id: &str,
    action: fn(&mut SurveyManager) -> Vec<ChatMessage>,
) -> Response {
    let survey = match lookup(state, id).await {
        Ok(survey) => survey,
        Err(response) => return response,
    };
    let mut manager = match try_lock(&survey, id) {
        Ok(manager) => manager,
        Err(response) => return response,
    };
    let replies = action(&mut *manager);
    Json(json!({
        "phase": manager.phase(),
        "replies": replies,
    }))
    .into_response()
}

// ── Helpers ─────────────────────────────────────────────────────────────

async fn with_session(
    state: &SurveyRouteState,
    id: &str,
    f: impl FnOnce(&SurveyManager) -> Response,
) -> Response {
    let survey = match lookup(state, id).await {
        Ok(survey) => survey,
        Err(response) => return response,
    };
    match try_lock(&survey, id) {
        Ok(manager) => f(&*manager),
        Err(response) => response,
    }
}

async fn lookup(state: &SurveyRouteState, id: &str) -> Result<SharedSurvey, Response> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Session not found"))
}

/// A held lock means a turn is still running for this session.
fn try_lock<'a>(survey: &'a SharedSurvey, id: &str) -> Result<MutexGuard<'a, SurveyManager>, Response> {
    survey.try_lock().map_err(|_| {
        tracing::debug!(session_id = %id, "Session busy");
        error(StatusCode::CONFLICT, "Session is busy with a previous message")
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
