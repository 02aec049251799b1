use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of feed post categories. The classifier's output is parsed
/// into this enum, so an out-of-set value never reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostType {
    Event,
    LostFound,
    Announcement,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Event => "EVENT",
            PostType::LostFound => "LOST_FOUND",
            PostType::Announcement => "ANNOUNCEMENT",
        }
    }

    pub fn parse(s: &str) -> Option<PostType> {
        match s {
            "EVENT" => Some(PostType::Event),
            "LOST_FOUND" => Some(PostType::LostFound),
            "ANNOUNCEMENT" => Some(PostType::Announcement),
            _ => None,
        }
    }

    /// Title used by the heuristic classifier when no provider is configured.
    pub fn default_title(&self) -> &'static str {
        match self {
            PostType::Event => "Upcoming Event",
            PostType::LostFound => "Lost & Found",
            PostType::Announcement => "Announcement",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventContent {
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LostFoundContent {
    pub item: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub is_lost: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnouncementContent {
    pub department: Option<String>,
    pub content: Option<String>,
    pub priority: Option<String>,
}

/// Structured post body. Invariant: the variant always matches the owning
/// post's `post_type`; both construction paths below go through the type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PostContent {
    Event(EventContent),
    LostFound(LostFoundContent),
    Announcement(AnnouncementContent),
}

impl PostContent {
    /// Parse a free-form JSON record into the shape demanded by `post_type`.
    /// Unknown fields are ignored; missing fields default to `None`.
    pub fn from_value(post_type: PostType, value: Value) -> Result<Self, serde_json::Error> {
        match post_type {
            PostType::Event => serde_json::from_value(value).map(PostContent::Event),
            PostType::LostFound => serde_json::from_value(value).map(PostContent::LostFound),
            PostType::Announcement => serde_json::from_value(value).map(PostContent::Announcement),
        }
    }

    /// Heuristic-mode content: the raw prompt lands in the variant's main
    /// text field.
    pub fn from_prompt(post_type: PostType, prompt: &str) -> Self {
        match post_type {
            PostType::Event => PostContent::Event(EventContent {
                description: Some(prompt.to_string()),
                ..Default::default()
            }),
            PostType::LostFound => PostContent::LostFound(LostFoundContent {
                item: Some(prompt.to_string()),
                ..Default::default()
            }),
            PostType::Announcement => PostContent::Announcement(AnnouncementContent {
                content: Some(prompt.to_string()),
                ..Default::default()
            }),
        }
    }

    pub fn post_type(&self) -> PostType {
        match self {
            PostContent::Event(_) => PostType::Event,
            PostContent::LostFound(_) => PostType::LostFound,
            PostContent::Announcement(_) => PostType::Announcement,
        }
    }

    /// Re-shape into another type's field set; shared fields carry over,
    /// the rest default. Used when an update changes `post_type` without
    /// supplying a new content record.
    pub fn reshape(&self, post_type: PostType) -> Self {
        if self.post_type() == post_type {
            return self.clone();
        }
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        Self::from_value(post_type, value).unwrap_or_else(|_| match post_type {
            PostType::Event => PostContent::Event(EventContent::default()),
            PostType::LostFound => PostContent::LostFound(LostFoundContent::default()),
            PostType::Announcement => PostContent::Announcement(AnnouncementContent::default()),
        })
    }
}

/// Reaction counters carried by every post. Counts only ever grow; there is
/// no per-user dedup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReactions {
    pub going: u32,
    pub interested: u32,
    pub not_going: u32,
    pub likes: u32,
    pub love: u32,
    pub laugh: u32,
    pub wow: u32,
}

impl PostReactions {
    /// Increment the named counter. Unrecognized kinds are ignored.
    pub fn increment(&mut self, kind: &str) -> bool {
        let counter = match kind {
            "going" => &mut self.going,
            "interested" => &mut self.interested,
            "notGoing" => &mut self.not_going,
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

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub prompt: String,
    pub post_type: PostType,
    pub title: String,
    pub content: PostContent,
    pub user_id: String,
    pub attachment: Option<String>,
    pub toxicity_score: f32,
    pub is_appropriate: bool,
    pub reactions: PostReactions,
    /// Never populated server-side; threads are served by the comments API.
    pub comments: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update accepted by `PUT /api/posts/{id}`. Only these three
/// fields are mutable after creation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<Value>,
    pub post_type: Option<PostType>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_type_round_trips_through_wire_names() {
        for (post_type, name) in [
            (PostType::Event, "EVENT"),
            (PostType::LostFound, "LOST_FOUND"),
            (PostType::Announcement, "ANNOUNCEMENT"),
        ] {
            assert_eq!(post_type.as_str(), name);
            assert_eq!(PostType::parse(name), Some(post_type));
            assert_eq!(
                serde_json::to_value(post_type).unwrap(),
                Value::String(name.to_string())
            );
        }
        assert_eq!(PostType::parse("GOSSIP"), None);
    }

    #[test]
    fn content_parses_by_declared_type() {
        let value = json!({"item": "wallet", "location": "library", "isLost": true});
        let content = PostContent::from_value(PostType::LostFound, value).unwrap();
        match content {
            PostContent::LostFound(ref lf) => {
                assert_eq!(lf.item.as_deref(), Some("wallet"));
                assert_eq!(lf.is_lost, Some(true));
            }
            ref other => panic!("wrong variant: {:?}", other),
        }
        assert_eq!(content.post_type(), PostType::LostFound);
    }

    #[test]
    fn content_reshape_carries_shared_fields() {
        let event = PostContent::Event(EventContent {
            description: Some("robotics demo".to_string()),
            location: Some("CSE Lab".to_string()),
            date: Some("tomorrow".to_string()),
            time: None,
        });
        match event.reshape(PostType::LostFound) {
            PostContent::LostFound(lf) => {
                assert_eq!(lf.location.as_deref(), Some("CSE Lab"));
                assert_eq!(lf.date.as_deref(), Some("tomorrow"));
                assert_eq!(lf.item, None);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn unknown_reaction_kind_is_ignored() {
        let mut reactions = PostReactions::default();
        assert!(reactions.increment("likes"));
        assert!(reactions.increment("likes"));
        assert!(!reactions.increment("unknownKind"));
        assert_eq!(reactions.likes, 2);
        assert_eq!(reactions, PostReactions { likes: 2, ..Default::default() });
    }
}
