use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::Comment,
};

pub fn create_comments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_comment))
        .route("/post/{post_id}", get(list_comments_for_post))
        .route("/{id}", put(update_comment).delete(delete_comment))
        .route("/{id}/reactions", post(add_comment_reaction))
        .route("/{id}/replies", get(list_replies))
}

async fn list_comments_for_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Json<Vec<Comment>> {
    Json(state.comments.list_by_post(post_id).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest {
    post_id: Option<i64>,
    content: Option<String>,
    user_id: Option<String>,
    parent_id: Option<i64>,
}

async fn create_comment(
    State(state): State<AppState>,
    Json(request): Json<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let (post_id, content) = match (request.post_id, request.content.filter(|c| !c.is_empty())) {
        (Some(post_id), Some(content)) => (post_id, content),
        _ => {
            return Err(AppError::Validation(
                "PostId and content are required".to_string(),
            ))
        }
    };

    let comment = state
        .comments
        .create(post_id, content, request.user_id, request.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
struct UpdateCommentRequest {
    content: Option<String>,
}

async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCommentRequest>,
) -> AppResult<Json<Comment>> {
    let content = request
        .content
        .ok_or_else(|| AppError::Validation("Content is required".to_string()))?;
    Ok(Json(state.comments.update(id, content).await?))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.comments.delete(id).await?;
    Ok(Json(json!({"message": "Comment deleted successfully"})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReactionRequest {
    reaction_type: Option<String>,
}

async fn add_comment_reaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ReactionRequest>,
) -> AppResult<Json<Comment>> {
    let kind = request.reaction_type.unwrap_or_default();
    Ok(Json(state.comments.add_reaction(id, &kind).await?))
}

async fn list_replies(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.replies(id).await?))
}
