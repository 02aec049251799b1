// HTTP surface. Handlers are thin: request shaping and validation here,
// everything else in the stores and the AI service.

pub mod ai;
pub mod comments;
pub mod posts;

use axum::Router;

use crate::app_state::AppState;

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::create_posts_router())
        .nest("/comments", comments::create_comments_router())
        .nest("/ai", ai::create_ai_router())
}
