//! In-memory thread store
//!
//! All state lives behind a single `RwLock`. Creates hold the write guard for
//! validation, ID assignment and index update together; reads take the read
//! guard once and walk the tree through the borrowed state, so recursion never
//! touches the lock again. Users never change, so authors are copied into
//! posts and comments at creation. State is lost when the store is dropped.

use super::{Anchor, ThreadStore, MAX_REPLY_DEPTH};
use crate::domain::models::{Comment, NewComment, NewPost, NewUser, Page, PageRequest, Post, User};
use crate::error::{StoreError, StoreResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    /// Direct children of each anchor, in creation order
    children: HashMap<Anchor, Vec<i64>>,
}

impl MemoryState {
    // IDs are never reused because nothing is ever removed
    fn next_user_id(&self) -> i64 {
        self.users.len() as i64 + 1
    }

    fn next_post_id(&self) -> i64 {
        self.posts.len() as i64 + 1
    }

    fn next_comment_id(&self) -> i64 {
        self.comments.len() as i64 + 1
    }

    /// Check a new comment in fixed order and return its author.
    fn validate_comment(&self, new_comment: &NewComment) -> StoreResult<User> {
        let author = self
            .users
            .get(&new_comment.user_id)
            .ok_or(StoreError::UserNotFound(new_comment.user_id))?;

        let post = self
            .posts
            .get(&new_comment.post_id)
            .ok_or(StoreError::PostNotFound(new_comment.post_id))?;

        if !post.comments_enabled {
            return Err(StoreError::CommentsDisabled(post.id));
        }

        if let Some(parent_id) = new_comment.parent_id {
            let parent = self
                .comments
                .get(&parent_id)
                .ok_or(StoreError::ParentNotFound(parent_id))?;

            if parent.post_id != new_comment.post_id {
                return Err(StoreError::PostMismatch {
                    reply_post_id: new_comment.post_id,
                    parent_post_id: parent.post_id,
                });
            }
        }

        Ok(author.clone())
    }

    /// Page the direct children of `anchor` and expand each child's replies
    /// until `depth` passes the cap.
    fn page_children(&self, anchor: Anchor, depth: u32, page: PageRequest) -> Page<Comment> {
        if depth > MAX_REPLY_DEPTH {
            return Page::default();
        }

        let Some(child_ids) = self.children.get(&anchor) else {
            return Page::default();
        };

        let items = page
            .slice(child_ids)
            .iter()
            .filter_map(|id| self.comments.get(id))
            .map(|stored| {
                let mut comment = stored.clone();
                comment.replies =
                    self.page_children(Anchor::Comment(comment.id), depth + 1, page);
                comment
            })
            .collect();

        Page::new(items, child_ids.len() as i64)
    }
}

/// Process-local implementation of [`ThreadStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryThreadStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().await;

        let user = User {
            id: state.next_user_id(),
            username: new_user.username,
        };
        state.users.insert(user.id, user.clone());

        info!(user_id = user.id, "Created user in memory store");
        Ok(user)
    }

    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        let mut state = self.state.write().await;

        let author = state
            .users
            .get(&new_post.user_id)
            .cloned()
            .ok_or(StoreError::UserNotFound(new_post.user_id))?;

        let post = Post {
            id: state.next_post_id(),
            title: new_post.title,
            content: new_post.content,
            user_id: new_post.user_id,
            author,
            comments_enabled: new_post.comments_enabled,
            comments: Page::default(),
        };
        state.posts.insert(post.id, post.clone());

        info!(
            post_id = post.id,
            user_id = post.user_id,
            comments_enabled = post.comments_enabled,
            "Created post in memory store"
        );
        Ok(post)
    }

    async fn create_comment(&self, new_comment: NewComment) -> StoreResult<Comment> {
        let mut state = self.state.write().await;

        let author = state.validate_comment(&new_comment)?;

        let comment = Comment {
            id: state.next_comment_id(),
            post_id: new_comment.post_id,
            user_id: new_comment.user_id,
            author,
            content: new_comment.content,
            parent_id: new_comment.parent_id,
            replies: Page::default(),
        };

        let anchor = match comment.parent_id {
            Some(parent_id) => Anchor::Comment(parent_id),
            None => Anchor::Post(comment.post_id),
        };
        state.comments.insert(comment.id, comment.clone());
        state.children.entry(anchor).or_default().push(comment.id);

        info!(
            comment_id = comment.id,
            post_id = comment.post_id,
            parent_id = ?comment.parent_id,
            "Created comment in memory store"
        );
        Ok(comment)
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<User> {
        let state = self.state.read().await;

        state
            .users
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::UserNotFound(user_id))
    }

    async fn list_posts(&self, page: PageRequest) -> StoreResult<Page<Post>> {
        let state = self.state.read().await;

        let posts: Vec<Post> = state
            .posts
            .values()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();

        debug!(
            returned = posts.len(),
            total = state.posts.len(),
            offset = page.offset,
            "Listed posts from memory store"
        );
        Ok(Page::new(posts, state.posts.len() as i64))
    }

    async fn get_post(&self, post_id: i64, page: PageRequest) -> StoreResult<Post> {
        let state = self.state.read().await;

        let mut post = state
            .posts
            .get(&post_id)
            .cloned()
            .ok_or(StoreError::PostNotFound(post_id))?;

        // Root comments sit at depth 0
        post.comments = state.page_children(Anchor::Post(post_id), 0, page);

        debug!(
            post_id,
            root_comments = post.comments.total_count,
            "Loaded post from memory store"
        );
        Ok(post)
    }

    async fn get_comment(&self, comment_id: i64, page: PageRequest) -> StoreResult<Comment> {
        let state = self.state.read().await;

        let mut comment = state
            .comments
            .get(&comment_id)
            .cloned()
            .ok_or(StoreError::CommentNotFound(comment_id))?;

        // The anchor comment is already one level down
        comment.replies = state.page_children(Anchor::Comment(comment_id), 1, page);

        debug!(
            comment_id,
            replies = comment.replies.total_count,
            "Loaded comment from memory store"
        );
        Ok(comment)
    }
}
