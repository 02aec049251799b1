// Campus Feed Server - HTTP API for the post/comment feed

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use campus_feed::{api::create_api_router, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;
    if app_state.ai.is_enabled() {
        info!("AI provider configured, classification/moderation/memes enabled");
    } else {
        info!("No OPENAI_API_KEY set, running with heuristic fallbacks");
    }

    // Build main application router
    let app = Router::new()
        .nest("/api", create_api_router())
        .nest_service("/uploads", ServeDir::new(&config.uploads.dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .layer(DefaultBodyLimit::max(config.uploads.max_file_bytes + 1024 * 1024))
        .with_state(app_state);

    // Start server
    let addr = config.server_address();
    println!("🚀 Campus Feed Server starting on http://{}", addr);
    println!("📋 API endpoints:");
    println!("  GET    /api/posts                       - List posts (newest first)");
    println!("  GET    /api/posts/type/{{postType}}       - List posts of one type");
    println!("  POST   /api/posts                       - Create post (multipart, AI-classified)");
    println!("  GET    /api/posts/{{id}}                  - Get post");
    println!("  PUT    /api/posts/{{id}}                  - Update post");
    println!("  DELETE /api/posts/{{id}}                  - Delete post");
    println!("  POST   /api/posts/{{id}}/reactions        - React to post");
    println!("  GET    /api/comments/post/{{postId}}      - List comments for post");
    println!("  POST   /api/comments                    - Create comment (/meme trigger supported)");
    println!("  PUT    /api/comments/{{id}}               - Update comment");
    println!("  DELETE /api/comments/{{id}}               - Delete comment");
    println!("  POST   /api/comments/{{id}}/reactions     - React to comment");
    println!("  GET    /api/comments/{{id}}/replies       - List direct replies");
    println!("  POST   /api/ai/classify|meme|toxicity|enhance - AI passthroughs");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
