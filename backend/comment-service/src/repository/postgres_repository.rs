use super::{Anchor, ThreadStore, MAX_REPLY_DEPTH};
use crate::domain::models::{Comment, NewComment, NewPost, NewUser, Page, PageRequest, Post, User};
use crate::error::{StoreError, StoreResult};
use futures::future::{BoxFuture, FutureExt};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, info};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    user_id: i64,
    author_username: String,
    comments_enabled: bool,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            author: User {
                id: row.user_id,
                username: row.author_username,
            },
            comments_enabled: row.comments_enabled,
            comments: Page::default(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    user_id: i64,
    author_username: String,
    content: String,
    parent_id: Option<i64>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            author: User {
                id: row.user_id,
                username: row.author_username,
            },
            content: row.content,
            parent_id: row.parent_id,
            replies: Page::default(),
        }
    }
}

/// A page row plus the size of the whole filtered set (`COUNT(*) OVER ()`)
#[derive(Debug, sqlx::FromRow)]
struct CountedPostRow {
    #[sqlx(flatten)]
    post: PostRow,
    total_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CountedCommentRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    total_count: i64,
}

/// PostgreSQL thread store
///
/// Creates validate with point lookups and insert inside one transaction; the
/// looked-up rows are locked `FOR KEY SHARE` until commit. Tree reads run in a
/// single read-only `REPEATABLE READ` transaction, one page query per anchor,
/// so every level of a view comes from the same snapshot.
#[derive(Clone)]
pub struct PostgresThreadStore {
    pool: PgPool,
}

const POST_COLUMNS: &str =
    "p.id, p.title, p.content, p.user_id, u.username AS author_username, p.comments_enabled";

const COMMENT_COLUMNS: &str =
    "c.id, c.post_id, c.user_id, u.username AS author_username, c.content, c.parent_id";

impl PostgresThreadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Comment store migrations applied");
        Ok(())
    }

    async fn begin_snapshot(&self) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn ensure_user_exists(conn: &mut PgConnection, user_id: i64) -> StoreResult<()> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR KEY SHARE")
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(StoreError::UserNotFound(user_id)),
        }
    }

    async fn ensure_post_accepts_comments(conn: &mut PgConnection, post_id: i64) -> StoreResult<()> {
        let comments_enabled: Option<bool> =
            sqlx::query_scalar("SELECT comments_enabled FROM posts WHERE id = $1 FOR KEY SHARE")
                .bind(post_id)
                .fetch_optional(&mut *conn)
                .await?;

        match comments_enabled {
            None => Err(StoreError::PostNotFound(post_id)),
            Some(false) => Err(StoreError::CommentsDisabled(post_id)),
            Some(true) => Ok(()),
        }
    }

    async fn ensure_parent_on_post(
        conn: &mut PgConnection,
        post_id: i64,
        parent_id: i64,
    ) -> StoreResult<()> {
        let parent_post_id: Option<i64> =
            sqlx::query_scalar("SELECT post_id FROM comments WHERE id = $1 FOR KEY SHARE")
                .bind(parent_id)
                .fetch_optional(&mut *conn)
                .await?;

        match parent_post_id {
            None => Err(StoreError::ParentNotFound(parent_id)),
            Some(parent_post_id) if parent_post_id != post_id => Err(StoreError::PostMismatch {
                reply_post_id: post_id,
                parent_post_id,
            }),
            Some(_) => Ok(()),
        }
    }

    fn anchor_filter(anchor: Anchor) -> (&'static str, i64) {
        match anchor {
            Anchor::Post(post_id) => ("c.post_id = $1 AND c.parent_id IS NULL", post_id),
            Anchor::Comment(comment_id) => ("c.parent_id = $1", comment_id),
        }
    }

    async fn count_children(conn: &mut PgConnection, anchor: Anchor) -> StoreResult<i64> {
        let (filter, key) = Self::anchor_filter(anchor);
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM comments c WHERE {}",
            filter
        ))
        .bind(key)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    async fn fetch_children(
        conn: &mut PgConnection,
        anchor: Anchor,
        page: PageRequest,
    ) -> StoreResult<Vec<CountedCommentRow>> {
        let (filter, key) = Self::anchor_filter(anchor);
        let rows = sqlx::query_as::<_, CountedCommentRow>(&format!(
            r#"
            SELECT {}, COUNT(*) OVER () AS total_count
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE {}
            ORDER BY c.id ASC
            LIMIT $2 OFFSET $3
            "#,
            COMMENT_COLUMNS, filter
        ))
        .bind(key)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Total size of a set whose page came back empty. An empty first page
    /// with a positive limit means the set itself is empty.
    async fn total_for_empty_page(
        conn: &mut PgConnection,
        anchor: Anchor,
        page: PageRequest,
    ) -> StoreResult<i64> {
        if page.offset == 0 && page.limit > 0 {
            return Ok(0);
        }
        Self::count_children(conn, anchor).await
    }

    /// Page the direct children of `anchor`, then recurse per child until
    /// `depth` passes the cap. All queries share `conn`'s snapshot.
    fn page_children<'c>(
        conn: &'c mut PgConnection,
        anchor: Anchor,
        depth: u32,
        page: PageRequest,
    ) -> BoxFuture<'c, StoreResult<Page<Comment>>> {
        async move {
            if depth > MAX_REPLY_DEPTH {
                return Ok(Page::default());
            }

            let rows = Self::fetch_children(&mut *conn, anchor, page).await?;
            let total_count = match rows.first() {
                Some(first) => first.total_count,
                None => Self::total_for_empty_page(&mut *conn, anchor, page).await?,
            };

            let mut items = Vec::with_capacity(rows.len());
            for row in rows {
                let mut comment = Comment::from(row.comment);
                comment.replies = Self::page_children(
                    &mut *conn,
                    Anchor::Comment(comment.id),
                    depth + 1,
                    page,
                )
                .await?;
                items.push(comment);
            }

            Ok(Page::new(items, total_count))
        }
        .boxed()
    }
}

#[async_trait::async_trait]
impl ThreadStore for PostgresThreadStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username)
            VALUES ($1)
            RETURNING id, username
            "#,
        )
        .bind(new_user.username)
        .fetch_one(&self.pool)
        .await?;

        info!(user_id = row.id, "Created user in PostgreSQL");
        Ok(row.into())
    }

    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        let mut tx = self.pool.begin().await?;

        Self::ensure_user_exists(&mut tx, new_post.user_id).await?;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r#"
            WITH p AS (
                INSERT INTO posts (title, content, user_id, comments_enabled)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title, content, user_id, comments_enabled
            )
            SELECT {}
            FROM p
            JOIN users u ON u.id = p.user_id
            "#,
            POST_COLUMNS
        ))
        .bind(new_post.title)
        .bind(new_post.content)
        .bind(new_post.user_id)
        .bind(new_post.comments_enabled)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            post_id = row.id,
            user_id = row.user_id,
            comments_enabled = row.comments_enabled,
            "Created post in PostgreSQL"
        );
        Ok(row.into())
    }

    async fn create_comment(&self, new_comment: NewComment) -> StoreResult<Comment> {
        // Dropping `tx` on an early return rolls back and releases the row locks
        let mut tx = self.pool.begin().await?;

        Self::ensure_user_exists(&mut tx, new_comment.user_id).await?;
        Self::ensure_post_accepts_comments(&mut tx, new_comment.post_id).await?;
        if let Some(parent_id) = new_comment.parent_id {
            Self::ensure_parent_on_post(&mut tx, new_comment.post_id, parent_id).await?;
        }

        let row = sqlx::query_as::<_, CommentRow>(&format!(
            r#"
            WITH c AS (
                INSERT INTO comments (post_id, user_id, content, parent_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id, post_id, user_id, content, parent_id
            )
            SELECT {}
            FROM c
            JOIN users u ON u.id = c.user_id
            "#,
            COMMENT_COLUMNS
        ))
        .bind(new_comment.post_id)
        .bind(new_comment.user_id)
        .bind(new_comment.content)
        .bind(new_comment.parent_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            comment_id = row.id,
            post_id = row.post_id,
            parent_id = ?row.parent_id,
            "Created comment in PostgreSQL"
        );
        Ok(row.into())
    }

    async fn get_user(&self, user_id: i64) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, username FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::from).ok_or(StoreError::UserNotFound(user_id))
    }

    async fn list_posts(&self, page: PageRequest) -> StoreResult<Page<Post>> {
        let mut tx = self.begin_snapshot().await?;

        let rows = sqlx::query_as::<_, CountedPostRow>(&format!(
            r#"
            SELECT {}, COUNT(*) OVER () AS total_count
            FROM posts p
            JOIN users u ON u.id = p.user_id
            ORDER BY p.id ASC
            LIMIT $1 OFFSET $2
            "#,
            POST_COLUMNS
        ))
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&mut *tx)
        .await?;

        let total_count = match rows.first() {
            Some(first) => first.total_count,
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts")
                    .fetch_one(&mut *tx)
                    .await?
            }
        };
        tx.commit().await?;

        debug!(
            returned = rows.len(),
            total = total_count,
            offset = page.offset,
            "Listed posts from PostgreSQL"
        );
        Ok(Page::new(
            rows.into_iter().map(|row| Post::from(row.post)).collect(),
            total_count,
        ))
    }

    async fn get_post(&self, post_id: i64, page: PageRequest) -> StoreResult<Post> {
        let mut tx = self.begin_snapshot().await?;

        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts p JOIN users u ON u.id = p.user_id WHERE p.id = $1",
            POST_COLUMNS
        ))
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::PostNotFound(post_id))?;

        let mut post = Post::from(row);
        // Root comments sit at depth 0
        post.comments = Self::page_children(&mut tx, Anchor::Post(post_id), 0, page).await?;
        tx.commit().await?;

        debug!(
            post_id,
            root_comments = post.comments.total_count,
            "Loaded post from PostgreSQL"
        );
        Ok(post)
    }

    async fn get_comment(&self, comment_id: i64, page: PageRequest) -> StoreResult<Comment> {
        let mut tx = self.begin_snapshot().await?;

        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "SELECT {} FROM comments c JOIN users u ON u.id = c.user_id WHERE c.id = $1",
            COMMENT_COLUMNS
        ))
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::CommentNotFound(comment_id))?;

        let mut comment = Comment::from(row);
        // The anchor comment is already one level down
        comment.replies =
            Self::page_children(&mut tx, Anchor::Comment(comment_id), 1, page).await?;
        tx.commit().await?;

        debug!(
            comment_id,
            replies = comment.replies.total_count,
            "Loaded comment from PostgreSQL"
        );
        Ok(comment)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
