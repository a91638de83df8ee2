//! HTTP request handlers

use super::types::{
    AnswerRequest, CharacterResponse, ErrorResponse, ProgressQuery, ProgressResponse,
    QuestionRequest, SessionResponse, UserReply, WebhookRequest, WebhookResponse,
};
use super::AppState;
use crate::catalog;
use crate::db::DbError;
use crate::lexicon::{Publisher, MAX_GRADE, MIN_GRADE};
use crate::practice::{PracticeError, Question, Verdict};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// Lesson titles listed per character lookup
const CHARACTER_LESSON_LIMIT: usize = 10;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Liveness and build info
        .route("/health", get(health))
        .route("/version", get(get_version))
        // Chat channel
        .route("/webhook", post(webhook))
        // Session inspection
        .route("/api/sessions/:user_id", get(get_session))
        // Catalog
        .route("/api/progress", get(get_progress))
        .route("/api/characters/:character", get(get_character))
        // Practice
        .route("/api/practice/questions", post(create_question))
        .route("/api/practice/answers", post(check_answer))
        .with_state(state)
}

// ============================================================
// Health and Version
// ============================================================

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_version() -> &'static str {
    concat!("hanzi-helper ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Webhook
// ============================================================

/// Handle channel events in order. Per-event failures are already turned
/// into replies by the runtime, so this never fails the batch.
async fn webhook(
    State(state): State<AppState>,
    Json(req): Json<WebhookRequest>,
) -> Json<WebhookResponse> {
    let mut replies = Vec::new();

    for event in req.events {
        let Some((user_id, event)) = event.into_dialog_event() else {
            tracing::debug!("Ignoring unsupported channel event");
            continue;
        };
        if let Some(reply) = state.runtime.handle(&user_id, event).await {
            replies.push(UserReply { user_id, reply });
        }
    }

    Json(WebhookResponse { replies })
}

// ============================================================
// Session Inspection
// ============================================================

async fn get_session(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .runtime
        .session(&user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(SessionResponse { user_id, session }))
}

// ============================================================
// Catalog
// ============================================================

async fn get_progress(
    State(state): State<AppState>,
    Query(query): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>, AppError> {
    let publisher = Publisher::lookup(&query.publisher)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown publisher: {}", query.publisher)))?;
    if !(MIN_GRADE..=MAX_GRADE).contains(&query.grade) {
        return Err(AppError::BadRequest(format!(
            "Grade must be {MIN_GRADE}-{MAX_GRADE}"
        )));
    }
    if query.semester.is_some_and(|s| s != 1 && s != 2) {
        return Err(AppError::BadRequest("Semester must be 1 or 2".to_string()));
    }

    let docs = state
        .db
        .lessons_for_publisher(publisher.name())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ProgressResponse {
        progress: catalog::learning_progress(&docs, publisher, query.grade, query.semester),
    }))
}

async fn get_character(
    State(state): State<AppState>,
    Path(character): Path<String>,
) -> Result<Json<CharacterResponse>, AppError> {
    let info = state.db.get_character(&character).map_err(|e| match e {
        DbError::CharacterNotFound(_) => AppError::NotFound(e.to_string()),
        other => AppError::Internal(other.to_string()),
    })?;

    let mut docs = Vec::new();
    for publisher in Publisher::ALL {
        docs.extend(
            state
                .db
                .lessons_for_publisher(publisher.name())
                .map_err(|e| AppError::Internal(e.to_string()))?,
        );
    }

    Ok(Json(CharacterResponse {
        lessons: catalog::lessons_teaching(&docs, &info.character, CHARACTER_LESSON_LIMIT),
        info,
    }))
}

// ============================================================
// Practice
// ============================================================

async fn create_question(
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<Question>, AppError> {
    let question = state.practice.generate(req.kind).await.map_err(|e| match e {
        PracticeError::NoCharacters(_) => AppError::NotFound(e.to_string()),
        PracticeError::Source(_) => AppError::Internal(e.to_string()),
    })?;
    Ok(Json(question))
}

async fn check_answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Json<Verdict> {
    Json(state.practice.check_answer(&req.question_id, &req.answer))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
