use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    models::{Comment, CommentReactions},
    services::{AiService, ToxicityCheck},
};

/// Comment text starting with this trigger requests a generated meme; the
/// remainder of the line is the meme prompt.
const MEME_TRIGGER: &str = "/meme ";

struct CommentTable {
    next_id: i64,
    rows: BTreeMap<i64, Comment>,
}

impl CommentTable {
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

/// In-memory comment table. `post_id` is a non-owning reference (never
/// validated against the post table); `parent_id` and the parent's
/// `replies` list are kept bidirectionally consistent under the table's
/// write lock.
#[derive(Clone)]
pub struct CommentStore {
    ai: Arc<AiService>,
    inner: Arc<RwLock<CommentTable>>,
}

impl CommentStore {
    pub fn new(ai: Arc<AiService>) -> Self {
        Self {
            ai,
            inner: Arc::new(RwLock::new(CommentTable::new())),
        }
    }

    /// Create a comment, honoring the `/meme ` trigger. Meme generation
    /// failures are swallowed (the comment is created as plain text), and
    /// the toxicity check never fails. A `parent_id` that does not resolve
    /// leaves the comment unlinked rather than erroring.
    pub async fn create(
        &self,
        post_id: i64,
        content: String,
        user_id: Option<String>,
        parent_id: Option<i64>,
    ) -> AppResult<Comment> {
        let meme_prompt = content.strip_prefix(MEME_TRIGGER).map(str::to_owned);

        let mut content = content;
        let mut meme_url = None;
        if let Some(prompt) = meme_prompt {
            match self.ai.generate_meme(&prompt).await {
                Ok(Some(url)) => {
                    content = format!("Generated meme: {}", prompt);
                    meme_url = Some(url);
                }
                // No provider configured: the trigger is left in place as
                // ordinary text.
                Ok(None) => {}
                Err(err) => {
                    warn!("Meme generation failed, keeping original comment text: {}", err);
                }
            }
        }

        let toxicity = self.ai.check_toxicity(&content).await;

        let now = Utc::now();
        let user_id = user_id.unwrap_or_else(|| format!("user-{}", now.timestamp_millis()));

        let mut table = self.inner.write().await;
        let id = table.allocate_id();
        if let Some(parent_id) = parent_id {
            if let Some(parent) = table.rows.get_mut(&parent_id) {
                parent.replies.push(id);
            }
        }

        let comment = Comment {
            id,
            post_id,
            content,
            user_id,
            parent_id,
            is_meme: meme_url.is_some(),
            meme_url,
            toxicity_score: toxicity.toxicity_score,
            is_appropriate: toxicity.is_appropriate,
            reactions: CommentReactions::default(),
            replies: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(id, comment.clone());

        info!(comment_id = id, post_id, is_meme = comment.is_meme, "created comment");
        Ok(comment)
    }

    /// All comments on a post, in insertion order. The client rebuilds the
    /// thread tree from `parent_id`/`replies`.
    pub async fn list_by_post(&self, post_id: i64) -> Vec<Comment> {
        let table = self.inner.read().await;
        table
            .rows
            .values()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect()
    }

    /// Direct replies to a comment. Unknown ids are an error here (unlike
    /// `list_by_post`, which just filters).
    pub async fn replies(&self, id: i64) -> AppResult<Vec<Comment>> {
        let table = self.inner.read().await;
        if !table.rows.contains_key(&id) {
            return Err(AppError::NotFound(format!("Comment with id {} not found", id)));
        }
        Ok(table
            .rows
            .values()
            .filter(|comment| comment.parent_id == Some(id))
            .cloned()
            .collect())
    }

    /// Replace the text and re-run the toxicity check (which degrades to
    /// permissive on provider failure, as on create).
    pub async fn update(&self, id: i64, content: String) -> AppResult<Comment> {
        let toxicity: ToxicityCheck = self.ai.check_toxicity(&content).await;

        let mut table = self.inner.write().await;
        let comment = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", id)))?;
        comment.content = content;
        comment.toxicity_score = toxicity.toxicity_score;
        comment.is_appropriate = toxicity.is_appropriate;
        comment.updated_at = Utc::now();

        Ok(comment.clone())
    }

    /// Remove a comment: unlink it from its parent's `replies`, then remove
    /// its direct replies only. Grandchildren survive with a dangling
    /// `parent_id`.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut table = self.inner.write().await;
        let comment = table
            .rows
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", id)))?;

        if let Some(parent_id) = comment.parent_id {
            if let Some(parent) = table.rows.get_mut(&parent_id) {
                parent.replies.retain(|&reply_id| reply_id != id);
            }
        }

        table.rows.retain(|_, row| row.parent_id != Some(id));
        Ok(())
    }

    /// Same ignore-unknown-kind policy as posts.
    pub async fn add_reaction(&self, id: i64, kind: &str) -> AppResult<Comment> {
        let mut table = self.inner.write().await;
        let comment = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Comment with id {} not found", id)))?;
        comment.reactions.increment(kind);
        Ok(comment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CommentStore {
        CommentStore::new(Arc::new(AiService::disabled()))
    }

    #[tokio::test]
    async fn unresolved_parent_leaves_comment_unlinked() {
        let comments = store();
        let orphan = comments
            .create(1, "replying to nobody".to_string(), None, Some(42))
            .await
            .unwrap();
        assert_eq!(orphan.parent_id, Some(42));
        // still listed under its post, just not reachable through a parent
        let listed = comments.list_by_post(1).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, orphan.id);
    }

    #[tokio::test]
    async fn meme_trigger_without_provider_keeps_plain_text() {
        let comments = store();
        let comment = comments
            .create(1, "/meme campus life".to_string(), None, None)
            .await
            .unwrap();
        assert!(!comment.is_meme);
        assert_eq!(comment.meme_url, None);
        assert_eq!(comment.content, "/meme campus life");
    }

    #[tokio::test]
    async fn replies_of_unknown_comment_is_not_found() {
        let comments = store();
        assert!(matches!(
            comments.replies(7).await,
            Err(AppError::NotFound(_))
        ));
    }
}
