// Domain records for the feed: posts, threaded comments, reaction counters.

pub mod comment;
pub mod post;

pub use comment::{Comment, CommentReactions};
pub use post::{
    AnnouncementContent, EventContent, LostFoundContent, Post, PostContent, PostReactions,
    PostType, PostUpdate,
};
