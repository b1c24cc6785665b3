use crate::domain::models::{Comment, NewComment, NewPost, NewUser, Page, PageRequest, Post, User};
use crate::error::StoreResult;

/// Number of reply levels expanded below a comment anchor in one read.
/// Levels past the cap come back as empty pages.
pub const MAX_REPLY_DEPTH: u32 = 4;

/// Storage contract for users, posts and threaded comments.
/// Both MemoryThreadStore and PostgresThreadStore implement this and must be
/// observably identical for identical inputs.
#[async_trait::async_trait]
pub trait ThreadStore: Send + Sync {
    /// Create a user; always succeeds for a reachable backend
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    /// Create a post owned by an existing user
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post>;

    /// Create a comment or reply
    ///
    /// Checks run in order and the first failure is reported: user exists,
    /// post exists, post accepts comments, parent exists, parent is on the
    /// same post.
    async fn create_comment(&self, new_comment: NewComment) -> StoreResult<Comment>;

    /// Get a user by ID
    async fn get_user(&self, user_id: i64) -> StoreResult<User>;

    /// List posts ordered by ID; listed posts carry no comments
    async fn list_posts(&self, page: PageRequest) -> StoreResult<Page<Post>>;

    /// Get a post with its first page of root comments expanded recursively
    async fn get_post(&self, post_id: i64, page: PageRequest) -> StoreResult<Post>;

    /// Get a comment with its first page of replies expanded recursively
    async fn get_comment(&self, comment_id: i64, page: PageRequest) -> StoreResult<Comment>;

    /// Health check (optional)
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
