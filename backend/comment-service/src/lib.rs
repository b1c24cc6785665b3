/// Comment Service Library
///
/// Stores users, posts and threaded comments, and serves paginated,
/// depth-bounded views of the comment forest attached to a post.
///
/// # Modules
///
/// - `domain`: Plain data records for users, posts, comments and pages
/// - `repository`: Storage contract plus in-memory and PostgreSQL backends
/// - `services`: Service facade and new-comment notification hook
/// - `handlers`: HTTP request handlers
/// - `error`: Error taxonomy and HTTP error mapping
/// - `config`: Configuration management
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod repository;
pub mod services;

pub use config::Config;
pub use domain::models::{
    Comment, NewComment, NewPost, NewUser, Page, PageRequest, Post, User,
};
pub use error::{AppError, StoreError, StoreResult};
pub use repository::{MemoryThreadStore, PostgresThreadStore, ThreadStore, MAX_REPLY_DEPTH};
pub use services::ThreadService;
