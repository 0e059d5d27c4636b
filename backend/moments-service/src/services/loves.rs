/// Love service - love / unlove a post and keep its love aggregate current
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::metrics::record_operation;
use crate::models::User;
use crate::services::posts::find_active_post;
use std::sync::Arc;
use tracing::info;

pub struct LoveService {
    repo: Arc<dyn PostRepository>,
}

impl LoveService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn love_post(&self, user: &User, post_id: i64) -> Result<()> {
        let result = self.love_post_inner(user, post_id).await;
        record_operation("love_post", &result);
        result
    }

    pub async fn unlove_post(&self, user: &User, post_id: i64) -> Result<()> {
        let result = self.unlove_post_inner(user, post_id).await;
        record_operation("unlove_post", &result);
        result
    }

    async fn love_post_inner(&self, user: &User, post_id: i64) -> Result<()> {
        let mut tx = self.repo.begin().await?;
        find_active_post(tx.as_mut(), post_id).await?;

        if !tx.insert_love(post_id, user.user_id).await? {
            return Err(AppError::AlreadyLoved);
        }
        tx.refresh_love_count(post_id).await?;
        tx.commit().await?;

        info!(post_id, user_id = user.user_id, "post loved");
        Ok(())
    }

    async fn unlove_post_inner(&self, user: &User, post_id: i64) -> Result<()> {
        let mut tx = self.repo.begin().await?;
        find_active_post(tx.as_mut(), post_id).await?;

        if !tx.delete_love(post_id, user.user_id).await? {
            return Err(AppError::LoveNotFound);
        }
        tx.refresh_love_count(post_id).await?;
        tx.commit().await?;

        info!(post_id, user_id = user.user_id, "post unloved");
        Ok(())
    }
}
