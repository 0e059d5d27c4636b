use crate::error::{AppError, Result};
use crate::models::{ImageSlots, NewPost, Post, PostStatus, PostView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

/// Image slot columns, indexed by slot
const IMAGE_COLUMNS: [&str; 4] = ["img1", "img2", "img3", "img4"];

/// Post storage.
///
/// Mutations only happen through a `PostTransaction`, so every service
/// operation is one atomic unit. Page queries run outside a transaction.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn PostTransaction>>;

    /// Latest ACTIVE posts of a family, newest first
    async fn find_page_by_family(
        &self,
        family_id: i64,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<PostView>>;

    /// ACTIVE posts of a family with `post_id < before_post_id`, newest first
    async fn find_page_by_family_before(
        &self,
        family_id: i64,
        user_id: i64,
        before_post_id: i64,
        limit: i64,
    ) -> Result<Vec<PostView>>;
}

/// An open unit of work. Dropping it without `commit` discards every change.
#[async_trait]
pub trait PostTransaction: Send {
    async fn insert(&mut self, post: NewPost) -> Result<Post>;

    /// Any post with this id regardless of status, locked until the end of the transaction
    async fn find_by_id(&mut self, post_id: i64) -> Result<Option<Post>>;

    async fn update_content(&mut self, post_id: i64, content: &str) -> Result<()>;

    async fn update_image(&mut self, post_id: i64, slot: usize, url: &str) -> Result<()>;

    async fn set_inactive(&mut self, post_id: i64) -> Result<()>;

    /// Recompute `count_love` from the loves table
    async fn refresh_love_count(&mut self, post_id: i64) -> Result<()>;

    /// Hydrated view of an ACTIVE post, personalized for `user_id`
    async fn find_single_view(&mut self, user_id: i64, post_id: i64) -> Result<Option<PostView>>;

    /// Returns false when the love already exists
    async fn insert_love(&mut self, post_id: i64, user_id: i64) -> Result<bool>;

    /// Returns false when there was no love to delete
    async fn delete_love(&mut self, post_id: i64, user_id: i64) -> Result<bool>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

#[derive(sqlx::FromRow)]
struct PostRow {
    post_id: i64,
    writer_id: i64,
    family_id: i64,
    content: String,
    img1: Option<String>,
    img2: Option<String>,
    img3: Option<String>,
    img4: Option<String>,
    count_love: i64,
    status: PostStatus,
    created_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            post_id: row.post_id,
            writer_id: row.writer_id,
            family_id: row.family_id,
            content: row.content,
            images: ImageSlots::from_columns(row.img1, row.img2, row.img3, row.img4),
            count_love: row.count_love,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostViewRow {
    post_id: i64,
    writer: String,
    profile_img: Option<String>,
    content: String,
    img1: Option<String>,
    img2: Option<String>,
    img3: Option<String>,
    img4: Option<String>,
    created_at: DateTime<Utc>,
    count_love: i64,
    loved: bool,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        PostView {
            post_id: row.post_id,
            writer: row.writer,
            profile_img: row.profile_img,
            content: row.content,
            imgs: ImageSlots::from_columns(row.img1, row.img2, row.img3, row.img4),
            created_at: row.created_at,
            count_love: row.count_love,
            loved: row.loved,
        }
    }
}

/// PostgreSQL post repository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn begin(&self) -> Result<Box<dyn PostTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPostTransaction { tx }))
    }

    async fn find_page_by_family(
        &self,
        family_id: i64,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        let rows = sqlx::query_as::<_, PostViewRow>(
            r#"
            SELECT p.post_id, u.nickname AS writer, u.profile_img, p.content,
                   p.img1, p.img2, p.img3, p.img4, p.created_at, p.count_love,
                   EXISTS (
                       SELECT 1 FROM loves l WHERE l.post_id = p.post_id AND l.user_id = $2
                   ) AS loved
            FROM posts p
            JOIN users u ON u.user_id = p.writer_id
            WHERE p.family_id = $1 AND p.status = 'ACTIVE'
            ORDER BY p.post_id DESC
            LIMIT $3
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostView::from).collect())
    }

    async fn find_page_by_family_before(
        &self,
        family_id: i64,
        user_id: i64,
        before_post_id: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        let rows = sqlx::query_as::<_, PostViewRow>(
            r#"
            SELECT p.post_id, u.nickname AS writer, u.profile_img, p.content,
                   p.img1, p.img2, p.img3, p.img4, p.created_at, p.count_love,
                   EXISTS (
                       SELECT 1 FROM loves l WHERE l.post_id = p.post_id AND l.user_id = $2
                   ) AS loved
            FROM posts p
            JOIN users u ON u.user_id = p.writer_id
            WHERE p.family_id = $1 AND p.status = 'ACTIVE' AND p.post_id < $3
            ORDER BY p.post_id DESC
            LIMIT $4
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .bind(before_post_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostView::from).collect())
    }
}

pub struct PgPostTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PostTransaction for PgPostTransaction {
    async fn insert(&mut self, post: NewPost) -> Result<Post> {
        let [img1, img2, img3, img4] = [0, 1, 2, 3].map(|slot| post.images.get(slot));

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (writer_id, family_id, content, img1, img2, img3, img4, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'ACTIVE')
            RETURNING post_id, writer_id, family_id, content, img1, img2, img3, img4,
                      count_love, status, created_at
            "#,
        )
        .bind(post.writer_id)
        .bind(post.family_id)
        .bind(&post.content)
        .bind(img1)
        .bind(img2)
        .bind(img3)
        .bind(img4)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&mut self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT post_id, writer_id, family_id, content, img1, img2, img3, img4,
                   count_love, status, created_at
            FROM posts
            WHERE post_id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Post::from))
    }

    async fn update_content(&mut self, post_id: i64, content: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET content = $1, updated_at = NOW()
            WHERE post_id = $2
            "#,
        )
        .bind(content)
        .bind(post_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_image(&mut self, post_id: i64, slot: usize, url: &str) -> Result<()> {
        let column = IMAGE_COLUMNS
            .get(slot)
            .ok_or_else(|| AppError::BadRequest(format!("Image slot {} does not exist", slot)))?;

        let query = format!(
            "UPDATE posts SET {} = $1, updated_at = NOW() WHERE post_id = $2",
            column
        );

        sqlx::query(&query)
            .bind(url)
            .bind(post_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn set_inactive(&mut self, post_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET status = $1, updated_at = NOW()
            WHERE post_id = $2
            "#,
        )
        .bind(PostStatus::Inactive)
        .bind(post_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn refresh_love_count(&mut self, post_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE posts
            SET count_love = (SELECT COUNT(*) FROM loves WHERE post_id = $1)
            WHERE post_id = $1
            "#,
        )
        .bind(post_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_single_view(&mut self, user_id: i64, post_id: i64) -> Result<Option<PostView>> {
        let row = sqlx::query_as::<_, PostViewRow>(
            r#"
            SELECT p.post_id, u.nickname AS writer, u.profile_img, p.content,
                   p.img1, p.img2, p.img3, p.img4, p.created_at, p.count_love,
                   EXISTS (
                       SELECT 1 FROM loves l WHERE l.post_id = p.post_id AND l.user_id = $1
                   ) AS loved
            FROM posts p
            JOIN users u ON u.user_id = p.writer_id
            WHERE p.post_id = $2 AND p.status = 'ACTIVE'
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(PostView::from))
    }

    async fn insert_love(&mut self, post_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO loves (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_love(&mut self, post_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM loves
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }
}
