use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    models::{Post, PostContent, PostReactions, PostType, PostUpdate},
    services::AiService,
};

/// Guarded table state. The id counter lives inside the lock so that id
/// assignment and insertion happen atomically under one writer.
struct PostTable {
    next_id: i64,
    rows: BTreeMap<i64, Post>,
}

impl PostTable {
    fn new() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// In-memory post table plus the classification/moderation calls that gate
/// post creation. Provider calls always complete before the table lock is
/// taken.
#[derive(Clone)]
pub struct PostStore {
    ai: Arc<AiService>,
    inner: Arc<RwLock<PostTable>>,
}

impl PostStore {
    pub fn new(ai: Arc<AiService>) -> Self {
        Self {
            ai,
            inner: Arc::new(RwLock::new(PostTable::new())),
        }
    }

    /// Classify the prompt, score it for toxicity, then commit the post.
    /// Classification failures propagate; moderation failures never block
    /// the write (the check degrades to permissive inside the service).
    pub async fn create(
        &self,
        prompt: String,
        user_id: Option<String>,
        attachment: Option<String>,
    ) -> AppResult<Post> {
        let classification = self.ai.classify_post(&prompt).await?;
        let toxicity = self.ai.check_toxicity(&prompt).await;

        let content = PostContent::from_value(
            classification.post_type,
            classification.extracted_data,
        )
        .map_err(|err| {
            AppError::Provider(anyhow::anyhow!(
                "classifier returned malformed extracted data: {}",
                err
            ))
        })?;

        let now = Utc::now();
        let user_id = user_id.unwrap_or_else(|| format!("user-{}", now.timestamp_millis()));

        let mut table = self.inner.write().await;
        let id = table.allocate_id();
        let post = Post {
            id,
            prompt,
            post_type: classification.post_type,
            title: classification.suggested_title,
            content,
            user_id,
            attachment,
            toxicity_score: toxicity.toxicity_score,
            is_appropriate: toxicity.is_appropriate,
            reactions: PostReactions::default(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, post.clone());

        info!(post_id = id, post_type = post.post_type.as_str(), "created post");
        Ok(post)
    }

    /// All posts, newest first. Ties on `created_at` keep insertion order
    /// (the table iterates in id order and the sort is stable).
    pub async fn list(&self) -> Vec<Post> {
        let table = self.inner.read().await;
        let mut posts: Vec<Post> = table.rows.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    /// Posts of one type, in insertion order.
    pub async fn list_by_type(&self, post_type: PostType) -> Vec<Post> {
        let table = self.inner.read().await;
        table
            .rows
            .values()
            .filter(|post| post.post_type == post_type)
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: i64) -> AppResult<Post> {
        let table = self.inner.read().await;
        table
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))
    }

    /// Partial update of `title`, `content`, `postType`. A supplied content
    /// record must parse into the effective type's shape; when only the
    /// type changes, the stored content is re-shaped to keep the
    /// shape-matches-type invariant.
    pub async fn update(&self, id: i64, update: PostUpdate) -> AppResult<Post> {
        let mut table = self.inner.write().await;
        let post = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))?;

        if let Some(post_type) = update.post_type {
            post.post_type = post_type;
        }
        if let Some(title) = update.title {
            post.title = title;
        }
        match update.content {
            Some(value) => {
                post.content = PostContent::from_value(post.post_type, value).map_err(|err| {
                    AppError::Validation(format!(
                        "content does not match post type {}: {}",
                        post.post_type.as_str(),
                        err
                    ))
                })?;
            }
            None => {
                post.content = post.content.reshape(post.post_type);
            }
        }
        post.updated_at = Utc::now();

        Ok(post.clone())
    }

    /// Remove a post. Its comments are NOT removed: orphaned comments stay
    /// addressable through the comment store.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut table = self.inner.write().await;
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))
    }

    /// Increment a reaction counter. Unknown kinds are silently ignored and
    /// repeated calls keep incrementing.
    pub async fn add_reaction(&self, id: i64, kind: &str) -> AppResult<Post> {
        let mut table = self.inner.write().await;
        let post = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Post with id {} not found", id)))?;
        post.reactions.increment(kind);
        Ok(post.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> PostStore {
        PostStore::new(Arc::new(AiService::disabled()))
    }

    #[tokio::test]
    async fn ids_are_assigned_monotonically() {
        let posts = store();
        let first = posts
            .create("Lost my keys".to_string(), None, None)
            .await
            .unwrap();
        let second = posts
            .create("Found a bag".to_string(), None, None)
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn update_reshapes_content_when_type_changes() {
        let posts = store();
        let created = posts
            .create(
                "Workshop on Docker tomorrow at 5pm in CSE Lab".to_string(),
                None,
                None,
            )
            .await
            .unwrap();
        assert_eq!(created.post_type, PostType::Event);

        let updated = posts
            .update(
                created.id,
                PostUpdate {
                    post_type: Some(PostType::Announcement),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.post_type, PostType::Announcement);
        assert_eq!(updated.content.post_type(), PostType::Announcement);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_rejects_content_of_the_wrong_shape() {
        let posts = store();
        let created = posts
            .create("Lost my black wallet".to_string(), None, None)
            .await
            .unwrap();

        let err = posts
            .update(
                created.id,
                PostUpdate {
                    content: Some(json!({"isLost": "definitely"})),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_posts_are_not_found() {
        let posts = store();
        assert!(matches!(posts.get(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(posts.delete(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            posts.add_reaction(99, "likes").await,
            Err(AppError::NotFound(_))
        ));
    }
}
