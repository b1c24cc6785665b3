use serde::{Deserialize, Serialize};

/// User entity - immutable after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Post entity
///
/// `author` is resolved from `user_id` on every read. `comments` is a read-time
/// view: the first page of root comments, each already carrying its own reply
/// page. It is empty on freshly created posts and in post listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub author: User,
    pub comments_enabled: bool,
    #[serde(default)]
    pub comments: Page<Comment>,
}

/// Comment entity - `parent_id` is `None` for root comments attached directly to the post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub author: User,
    pub content: String,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub replies: Page<Comment>,
}

/// A bounded slice of a collection plus the true size of that collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64) -> Self {
        Self { items, total_count }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Page window `(limit, offset)`, applied to every level of a comment tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Apply the window to an already ordered slice.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.offset as usize).min(items.len());
        let end = start.saturating_add(self.limit as usize).min(items.len());
        &items[start..end]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
        }
    }
}

/// Request to create a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
}

/// Request to create a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: i64,
    #[serde(default = "default_comments_enabled")]
    pub comments_enabled: bool,
}

/// Request to create a comment or, with `parent_id`, a reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

fn default_comments_enabled() -> bool {
    true
}
