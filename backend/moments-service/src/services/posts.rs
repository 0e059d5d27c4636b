/// Post service - family post creation, authorized edits and soft deletes, paging
use crate::db::{PostRepository, PostTransaction};
use crate::error::{AppError, Result};
use crate::metrics::{record_operation, IMAGE_UPLOAD_DURATION_SECONDS};
use crate::models::{
    CreatePostRequest, EditPostRequest, ImageSlots, NewPost, Post, PostView, User, MAX_IMAGES,
};
use image_store::{ImagePayload, ImageStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Posts per family page
pub const PAGE_SIZE: i64 = 10;

pub struct PostService {
    repo: Arc<dyn PostRepository>,
    images: Arc<dyn ImageStore>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, images: Arc<dyn ImageStore>) -> Self {
        Self { repo, images }
    }

    /// Upload the images and store a new post written by `user`
    pub async fn create_post(&self, user: &User, req: CreatePostRequest) -> Result<PostView> {
        let result = self.create_post_inner(user, req).await;
        record_operation("create_post", &result);
        result
    }

    /// Apply a partial update. Only the writer may edit.
    pub async fn edit_post(
        &self,
        user: &User,
        post_id: i64,
        req: EditPostRequest,
    ) -> Result<PostView> {
        let result = self.edit_post_inner(user, post_id, req).await;
        record_operation("edit_post", &result);
        result
    }

    /// Soft delete. Only the writer may delete.
    pub async fn delete_post(&self, user: &User, post_id: i64) -> Result<()> {
        let result = self.delete_post_inner(user, post_id).await;
        record_operation("delete_post", &result);
        result
    }

    /// One page of a family's posts, newest first. Without a cursor the
    /// latest page is returned; with one, only posts older than it.
    pub async fn list_posts(
        &self,
        user_id: i64,
        family_id: i64,
        before_post_id: Option<i64>,
    ) -> Result<Vec<PostView>> {
        let result = self.list_posts_inner(user_id, family_id, before_post_id).await;
        record_operation("list_posts", &result);
        result
    }

    /// Refresh the love aggregate, then read the hydrated post
    pub async fn get_single_post(&self, user_id: i64, post_id: i64) -> Result<PostView> {
        let result = self.get_single_post_inner(user_id, post_id).await;
        record_operation("get_single_post", &result);
        result
    }

    async fn create_post_inner(&self, user: &User, req: CreatePostRequest) -> Result<PostView> {
        let CreatePostRequest {
            family_id,
            content,
            mut images,
        } = req;

        if images.len() > MAX_IMAGES {
            debug!(
                user_id = user.user_id,
                dropped = images.len() - MAX_IMAGES,
                "ignoring images beyond the last slot"
            );
            images.truncate(MAX_IMAGES);
        }

        let urls = if images.is_empty() {
            Vec::new()
        } else {
            self.upload_many(images).await?
        };

        let new_post = NewPost {
            writer_id: user.user_id,
            family_id,
            content,
            images: ImageSlots::from_urls(urls),
        };

        let mut tx = self.repo.begin().await?;
        let post = tx.insert(new_post).await?;
        tx.commit().await?;

        info!(
            post_id = post.post_id,
            user_id = user.user_id,
            family_id,
            images = post.images.filled(),
            "post created"
        );

        Ok(PostView::freshly_created(&post, user))
    }

    async fn edit_post_inner(
        &self,
        user: &User,
        post_id: i64,
        req: EditPostRequest,
    ) -> Result<PostView> {
        // Refuse before uploading anything. No row lock is held while uploading.
        {
            let mut check = self.repo.begin().await?;
            find_owned_post(check.as_mut(), user.user_id, post_id).await?;
        }

        let mut uploaded = Vec::new();
        for (slot, image) in req.images.into_iter().enumerate() {
            if slot >= MAX_IMAGES {
                debug!(post_id, "ignoring image slots beyond the last slot");
                break;
            }
            let Some(image) = image else {
                continue;
            };

            uploaded.push((slot, self.upload_one(image).await?));
        }

        let mut tx = self.repo.begin().await?;
        // The post may have been deleted while the images were uploading
        find_owned_post(tx.as_mut(), user.user_id, post_id).await?;

        let mut view = load_single_view(tx.as_mut(), user.user_id, post_id).await?;

        if let Some(content) = req.content {
            tx.update_content(post_id, &content).await?;
            view.content = content;
        }

        for (slot, url) in uploaded {
            tx.update_image(post_id, slot, &url).await?;
            view.imgs.set(slot, url);
        }

        tx.commit().await?;

        info!(post_id, user_id = user.user_id, "post edited");
        Ok(view)
    }

    async fn delete_post_inner(&self, user: &User, post_id: i64) -> Result<()> {
        let mut tx = self.repo.begin().await?;
        find_owned_post(tx.as_mut(), user.user_id, post_id).await?;
        tx.set_inactive(post_id).await?;
        tx.commit().await?;

        info!(post_id, user_id = user.user_id, "post deleted");
        Ok(())
    }

    async fn list_posts_inner(
        &self,
        user_id: i64,
        family_id: i64,
        before_post_id: Option<i64>,
    ) -> Result<Vec<PostView>> {
        let page = match before_post_id {
            None => {
                self.repo
                    .find_page_by_family(family_id, user_id, PAGE_SIZE)
                    .await?
            }
            Some(before) => {
                self.repo
                    .find_page_by_family_before(family_id, user_id, before, PAGE_SIZE)
                    .await?
            }
        };

        if page.is_empty() {
            debug!(family_id, ?before_post_id, "family page is empty");
            return Err(AppError::EmptyPage);
        }

        Ok(page)
    }

    async fn get_single_post_inner(&self, user_id: i64, post_id: i64) -> Result<PostView> {
        let mut tx = self.repo.begin().await?;
        let view = load_single_view(tx.as_mut(), user_id, post_id).await;
        // The refresh is kept even when the post turns out to be missing
        tx.commit().await?;
        view
    }

    async fn upload_many(&self, images: Vec<ImagePayload>) -> Result<Vec<String>> {
        let expected = images.len();
        let timer = IMAGE_UPLOAD_DURATION_SECONDS
            .with_label_values(&["many"])
            .start_timer();
        let result = self.images.upload_many(images).await;
        timer.observe_duration();

        let urls = result?;
        if urls.len() != expected {
            return Err(AppError::UploadFailed(format!(
                "image store returned {} urls for {} images",
                urls.len(),
                expected
            )));
        }
        Ok(urls)
    }

    async fn upload_one(&self, image: ImagePayload) -> Result<String> {
        let timer = IMAGE_UPLOAD_DURATION_SECONDS
            .with_label_values(&["one"])
            .start_timer();
        let result = self.images.upload_one(image).await;
        timer.observe_duration();

        Ok(result?)
    }
}

/// Missing and INACTIVE posts both yield `PostNotFound`
pub(crate) async fn find_active_post(tx: &mut dyn PostTransaction, post_id: i64) -> Result<Post> {
    match tx.find_by_id(post_id).await? {
        Some(post) if post.is_active() => Ok(post),
        _ => {
            warn!(post_id, "post missing or inactive");
            Err(AppError::PostNotFound)
        }
    }
}

async fn find_owned_post(tx: &mut dyn PostTransaction, user_id: i64, post_id: i64) -> Result<Post> {
    let post = find_active_post(tx, post_id).await?;

    if !post.is_written_by(user_id) {
        warn!(post_id, user_id, writer_id = post.writer_id, "post modification refused");
        return Err(AppError::Forbidden);
    }

    Ok(post)
}

async fn load_single_view(
    tx: &mut dyn PostTransaction,
    user_id: i64,
    post_id: i64,
) -> Result<PostView> {
    tx.refresh_love_count(post_id).await?;
    tx.find_single_view(user_id, post_id)
        .await?
        .ok_or(AppError::PostNotFoundInvalidId)
}
