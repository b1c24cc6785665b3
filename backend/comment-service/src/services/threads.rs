/// Thread service - the single entry point the adapters call into
///
/// Wraps whichever `ThreadStore` backend is configured, logs rejected
/// operations, and publishes every created comment on a broadcast channel so a
/// notification layer can pick it up.
use crate::domain::models::{Comment, NewComment, NewPost, NewUser, Page, PageRequest, Post, User};
use crate::error::StoreResult;
use crate::repository::ThreadStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct ThreadService {
    store: Arc<dyn ThreadStore>,
    new_comments: broadcast::Sender<Comment>,
}

impl ThreadService {
    pub fn new(store: Arc<dyn ThreadStore>, channel_capacity: usize) -> Self {
        let (new_comments, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            store,
            new_comments,
        }
    }

    /// Receive every comment created after this call
    pub fn subscribe(&self) -> broadcast::Receiver<Comment> {
        self.new_comments.subscribe()
    }

    pub async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        logged("create_user", self.store.create_user(new_user).await)
    }

    pub async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        logged("create_post", self.store.create_post(new_post).await)
    }

    pub async fn create_comment(&self, new_comment: NewComment) -> StoreResult<Comment> {
        let comment = logged("create_comment", self.store.create_comment(new_comment).await)?;

        // No subscribers is fine
        match self.new_comments.send(comment.clone()) {
            Ok(receivers) => debug!(comment_id = comment.id, receivers, "Published new comment"),
            Err(_) => debug!(comment_id = comment.id, "No subscribers for new comment"),
        }

        Ok(comment)
    }

    pub async fn get_user(&self, user_id: i64) -> StoreResult<User> {
        logged("get_user", self.store.get_user(user_id).await)
    }

    pub async fn list_posts(&self, page: PageRequest) -> StoreResult<Page<Post>> {
        logged("list_posts", self.store.list_posts(page).await)
    }

    pub async fn get_post(&self, post_id: i64, page: PageRequest) -> StoreResult<Post> {
        logged("get_post", self.store.get_post(post_id, page).await)
    }

    pub async fn get_comment(&self, comment_id: i64, page: PageRequest) -> StoreResult<Comment> {
        logged("get_comment", self.store.get_comment(comment_id, page).await)
    }

    pub async fn health_check(&self) -> StoreResult<()> {
        logged("health_check", self.store.health_check().await)
    }
}

fn logged<T>(operation: &'static str, result: StoreResult<T>) -> StoreResult<T> {
    match &result {
        Err(err) if err.is_domain() => warn!(operation, error = %err, "Request rejected"),
        Err(err) => error!(operation, error = %err, "Storage backend failure"),
        Ok(_) => {}
    }
    result
}
