//! 主题、对局、反馈的 REST 接口

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use bingo_eden_core::{
    Feedback, GameId, GameRecord, NewFeedback, NewTemplate, StoreError, Template, TemplateError, TemplateId,
};

use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/health", get(health))
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/{id}", get(get_template).delete(delete_template))
        .route("/games", get(list_games))
        .route("/games/{id}", get(get_game).delete(delete_game))
        .route("/feedback", get(list_feedback).post(create_feedback))
}

// 处理函数的错误类型，序列化为 {"error": "..."}
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        warn!("存储操作失败: {}", e);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "存储暂时不可用")
    }
}

impl From<TemplateError> for ApiError {
    fn from(e: TemplateError) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, e.to_string())
    }
}

async fn health(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let completed_games = state.games.completed_count().await?;
    Ok(Json(json!({
        "status": "ok",
        "activeGames": state.sessions.len(),
        "completedGames": completed_games,
    })))
}

// --- 主题 ---

async fn list_templates(State(state): State<SharedState>) -> Result<Json<Vec<Template>>, ApiError> {
    Ok(Json(state.templates.list().await?))
}

async fn create_template(
    State(state): State<SharedState>,
    Json(new_template): Json<NewTemplate>,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let template = new_template.validate()?;
    state.templates.insert(template.clone()).await?;
    info!("创建主题 {} ({} 个选项)", template.name, template.items.len());
    Ok((StatusCode::CREATED, Json(template)))
}

async fn get_template(
    State(state): State<SharedState>,
    Path(id): Path<TemplateId>,
) -> Result<Json<Template>, ApiError> {
    state
        .templates
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("主题 {} 不存在", id)))
}

async fn delete_template(
    State(state): State<SharedState>,
    Path(id): Path<TemplateId>,
) -> Result<StatusCode, ApiError> {
    if state.templates.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(StatusCode::NOT_FOUND, format!("主题 {} 不存在", id)))
    }
}

// --- 对局 ---

async fn list_games(State(state): State<SharedState>) -> Result<Json<Vec<GameRecord>>, ApiError> {
    Ok(Json(state.games.list().await?))
}

async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<GameId>,
) -> Result<Json<GameRecord>, ApiError> {
    state
        .games
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("对局 {} 不存在", id)))
}

async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<GameId>,
) -> Result<StatusCode, ApiError> {
    // 进行中的对局之后还会保存进度，删除后会被重新写回
    if state.sessions.contains_key(&id) {
        return Err(ApiError::new(StatusCode::CONFLICT, "对局正在进行中，不能删除"));
    }
    if state.games.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(StatusCode::NOT_FOUND, format!("对局 {} 不存在", id)))
    }
}

// --- 反馈 ---

async fn list_feedback(State(state): State<SharedState>) -> Result<Json<Vec<Feedback>>, ApiError> {
    Ok(Json(state.feedback.list().await?))
}

async fn create_feedback(
    State(state): State<SharedState>,
    Json(new_feedback): Json<NewFeedback>,
) -> Result<(StatusCode, Json<Feedback>), ApiError> {
    let feedback = new_feedback.validate()?;
    state.feedback.insert(feedback.clone()).await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}
