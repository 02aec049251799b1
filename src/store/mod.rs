// In-memory tables for the feed. One lock-guarded table per entity type;
// nothing is persisted and everything is lost on restart.

pub mod comments;
pub mod posts;

pub use comments::CommentStore;
pub use posts::PostStore;
