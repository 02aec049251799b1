use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    config::UploadConfig,
    error::{AppError, AppResult},
    models::{Post, PostType, PostUpdate},
};

/// Extensions accepted for post attachments, matching the upload filter of
/// the browser client.
const ALLOWED_EXTENSIONS: [&str; 5] = ["jpeg", "jpg", "png", "gif", "pdf"];

pub fn create_posts_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/type/{post_type}", get(list_posts_by_type))
        .route("/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/{id}/reactions", post(add_post_reaction))
}

async fn list_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    Json(state.posts.list().await)
}

/// Unrecognized type names yield an empty list, not an error.
async fn list_posts_by_type(
    State(state): State<AppState>,
    Path(post_type): Path<String>,
) -> Json<Vec<Post>> {
    match PostType::parse(&post_type.to_uppercase()) {
        Some(post_type) => Json(state.posts.list_by_type(post_type).await),
        None => Json(Vec::new()),
    }
}

async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Post>> {
    Ok(Json(state.posts.get(id).await?))
}

/// Multipart form: `prompt` (required), `userId`, `attachment` (optional
/// file). The attachment is written to disk as its field is read, so a
/// failed classification can leave an unreferenced file behind.
async fn create_post(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Post>)> {
    let mut prompt = None;
    let mut user_id = None;
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(format!("Invalid multipart body: {}", err)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("prompt") => {
                prompt = Some(field.text().await.map_err(|err| {
                    AppError::Validation(format!("Invalid prompt field: {}", err))
                })?);
            }
            Some("userId") => {
                user_id = Some(field.text().await.map_err(|err| {
                    AppError::Validation(format!("Invalid userId field: {}", err))
                })?);
            }
            Some("attachment") => {
                let file_name = field.file_name().map(str::to_owned).unwrap_or_default();
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await.map_err(|err| {
                    AppError::Validation(format!("Invalid attachment field: {}", err))
                })?;
                attachment = Some(
                    save_attachment(
                        &state.config.uploads,
                        &file_name,
                        content_type.as_deref(),
                        &data,
                    )
                    .await?,
                );
            }
            _ => {}
        }
    }

    let prompt = prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Prompt is required".to_string()))?;

    let post = state.posts.create(prompt, user_id, attachment).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<PostUpdate>,
) -> AppResult<Json<Post>> {
    Ok(Json(state.posts.update(id, update).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    state.posts.delete(id).await?;
    Ok(Json(json!({"message": "Post deleted successfully"})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReactionRequest {
    reaction_type: Option<String>,
}

/// A missing or unknown `reactionType` is a no-op, never an error.
async fn add_post_reaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ReactionRequest>,
) -> AppResult<Json<Post>> {
    let kind = request.reaction_type.unwrap_or_default();
    Ok(Json(state.posts.add_reaction(id, &kind).await?))
}

/// Validate and persist one uploaded attachment, returning the public
/// `/uploads/...` path stored on the post.
async fn save_attachment(
    config: &UploadConfig,
    file_name: &str,
    content_type: Option<&str>,
    data: &[u8],
) -> AppResult<String> {
    if data.len() > config.max_file_bytes {
        return Err(AppError::Validation(format!(
            "Attachment exceeds the {} byte limit",
            config.max_file_bytes
        )));
    }

    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default();
    let mime_allowed = content_type
        .map(|ct| ct.starts_with("image/") || ct == "application/pdf")
        .unwrap_or(false);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) || !mime_allowed {
        return Err(AppError::Validation(
            "Only image and PDF files are allowed".to_string(),
        ));
    }

    tokio::fs::create_dir_all(&config.dir).await?;
    let stored_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4(), extension);
    let path = std::path::Path::new(&config.dir).join(&stored_name);
    tokio::fs::write(&path, data).await?;

    Ok(format!("/uploads/{}", stored_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_config(dir: &std::path::Path) -> UploadConfig {
        UploadConfig {
            dir: dir.to_string_lossy().into_owned(),
            max_file_bytes: 1024,
        }
    }

    #[tokio::test]
    async fn attachment_is_written_and_addressable() {
        let dir = tempfile::tempdir().unwrap();
        let config = upload_config(dir.path());

        let stored = save_attachment(&config, "poster.png", Some("image/png"), b"\x89PNG data")
            .await
            .unwrap();
        let stored_name = stored.strip_prefix("/uploads/").unwrap();
        assert!(stored_name.ends_with(".png"));
        assert!(dir.path().join(stored_name).exists());
    }

    #[tokio::test]
    async fn disallowed_file_types_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = upload_config(dir.path());

        let err = save_attachment(&config, "notes.txt", Some("text/plain"), b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // right extension, wrong declared type
        let err = save_attachment(&config, "notes.png", Some("text/plain"), b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn oversized_attachments_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = upload_config(dir.path());

        let big = vec![0u8; 2048];
        let err = save_attachment(&config, "photo.jpg", Some("image/jpeg"), &big)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
