use std::sync::Arc;

use crate::{
    config::Config,
    services::AiService,
    store::{CommentStore, PostStore},
};

#[derive(Clone)]
pub struct AppState {
    pub posts: PostStore,
    pub comments: CommentStore,
    pub ai: Arc<AiService>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // The uploads directory must exist before the first attachment lands.
        tokio::fs::create_dir_all(&config.uploads.dir).await?;

        let ai = Arc::new(AiService::from_config(&config.ai));

        Ok(Self {
            posts: PostStore::new(ai.clone()),
            comments: CommentStore::new(ai.clone()),
            ai,
            config,
        })
    }
}
