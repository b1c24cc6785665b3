mod memory_repository;
mod postgres_repository;
mod r#trait;

pub use memory_repository::MemoryThreadStore;
pub use postgres_repository::PostgresThreadStore;
pub use r#trait::{ThreadStore, MAX_REPLY_DEPTH};

/// Node whose direct children are being paged: a post for root comments,
/// a comment for replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Anchor {
    Post(i64),
    Comment(i64),
}
