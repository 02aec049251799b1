use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reaction counters carried by every comment; the post-only attendance
/// kinds (going/interested/notGoing) are not valid here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReactions {
    pub likes: u32,
    pub love: u32,
    pub laugh: u32,
    pub wow: u32,
}

impl CommentReactions {
    /// Increment the named counter. Unrecognized kinds are ignored.
    pub fn increment(&mut self, kind: &str) -> bool {
        let counter = match kind {
            "likes" => &mut self.likes,
            "love" => &mut self.love,
            "laugh" => &mut self.laugh,
            "wow" => &mut self.wow,
            _ => return false,
        };
        *counter += 1;
        true
    }
}

/// A threaded reply to a post.
///
/// `post_id` is a non-owning reference: it is never validated against the
/// post table, and deleting a post leaves its comments addressable.
/// `parent_id` and the parent's `replies` list form a bidirectional link
/// that the comment store keeps consistent on create and delete.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub user_id: String,
    pub parent_id: Option<i64>,
    pub meme_url: Option<String>,
    pub is_meme: bool,
    pub toxicity_score: f32,
    pub is_appropriate: bool,
    pub reactions: CommentReactions,
    /// Ids of direct replies, in creation order.
    pub replies: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_reactions_reject_post_only_kinds() {
        let mut reactions = CommentReactions::default();
        assert!(reactions.increment("wow"));
        assert!(!reactions.increment("going"));
        assert!(!reactions.increment("interested"));
        assert_eq!(reactions, CommentReactions { wow: 1, ..Default::default() });
    }
}
