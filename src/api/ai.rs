// Direct passthroughs to the classification/moderation boundary, mirroring
// what the feed endpoints do internally.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    models::PostType,
    services::{Classification, Enhancement, ToxicityCheck},
};

pub fn create_ai_router() -> Router<AppState> {
    Router::new()
        .route("/classify", post(classify))
        .route("/meme", post(generate_meme))
        .route("/toxicity", post(check_toxicity))
        .route("/enhance", post(enhance))
}

#[derive(Debug, Deserialize)]
struct PromptRequest {
    prompt: Option<String>,
}

async fn classify(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> AppResult<Json<Classification>> {
    let prompt = request
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Prompt is required".to_string()))?;
    Ok(Json(state.ai.classify_post(&prompt).await?))
}

/// Responds `{"memeUrl": null}` when no provider is configured; a failed
/// provider call is a hard error on this route (unlike the comment path).
async fn generate_meme(
    State(state): State<AppState>,
    Json(request): Json<PromptRequest>,
) -> AppResult<Json<Value>> {
    let prompt = request
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Prompt is required".to_string()))?;
    let meme_url = state.ai.generate_meme(&prompt).await?;
    Ok(Json(json!({ "memeUrl": meme_url })))
}

#[derive(Debug, Deserialize)]
struct ToxicityRequest {
    content: Option<String>,
}

async fn check_toxicity(
    State(state): State<AppState>,
    Json(request): Json<ToxicityRequest>,
) -> AppResult<Json<ToxicityCheck>> {
    let content = request
        .content
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Content is required".to_string()))?;
    Ok(Json(state.ai.check_toxicity(&content).await))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceRequest {
    prompt: Option<String>,
    post_type: Option<PostType>,
}

async fn enhance(
    State(state): State<AppState>,
    Json(request): Json<EnhanceRequest>,
) -> AppResult<Json<Enhancement>> {
    let (prompt, post_type) = match (
        request.prompt.filter(|p| !p.is_empty()),
        request.post_type,
    ) {
        (Some(prompt), Some(post_type)) => (prompt, post_type),
        _ => {
            return Err(AppError::Validation(
                "Prompt and postType are required".to_string(),
            ))
        }
    };
    Ok(Json(state.ai.enhance_post_content(&prompt, post_type).await?))
}
