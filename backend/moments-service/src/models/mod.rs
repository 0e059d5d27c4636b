/// Data models for moments-service
///
/// This module defines:
/// - Post: a family post with up to four image slots
/// - PostView: the hydrated shape returned to clients
/// - User: the acting user and writer display fields
/// - Request types handed from the HTTP layer to the services
use chrono::{DateTime, Utc};
use image_store::ImagePayload;
use serde::{Deserialize, Serialize};

/// Number of image slots on a post
pub const MAX_IMAGES: usize = 4;

/// Post lifecycle status. INACTIVE is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PostStatus {
    Active,
    Inactive,
}

/// Positional image slots (slot 0..3). Serialized as a four-element array
/// with `null` for empty slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSlots([Option<String>; MAX_IMAGES]);

impl ImageSlots {
    /// Fill slots in order; URLs beyond the fourth are dropped
    pub fn from_urls<I>(urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut slots = Self::default();
        for (slot, url) in urls.into_iter().take(MAX_IMAGES).enumerate() {
            slots.0[slot] = Some(url);
        }
        slots
    }

    pub fn from_columns(
        img1: Option<String>,
        img2: Option<String>,
        img3: Option<String>,
        img4: Option<String>,
    ) -> Self {
        Self([img1, img2, img3, img4])
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(|url| url.as_deref())
    }

    /// Overwrite one slot. Returns false when `slot` is out of range.
    pub fn set(&mut self, slot: usize, url: impl Into<String>) -> bool {
        match self.0.get_mut(slot) {
            Some(entry) => {
                *entry = Some(url.into());
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[Option<String>] {
        &self.0
    }

    /// Number of occupied slots
    pub fn filled(&self) -> usize {
        self.0.iter().filter(|url| url.is_some()).count()
    }
}

/// User as seen by this service: identity plus display fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub nickname: String,
    pub profile_img: Option<String>,
}

/// Stored post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub post_id: i64,
    pub writer_id: i64,
    pub family_id: i64,
    pub content: String,
    pub images: ImageSlots,
    pub count_love: i64,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_active(&self) -> bool {
        self.status == PostStatus::Active
    }

    pub fn is_written_by(&self, user_id: i64) -> bool {
        self.writer_id == user_id
    }
}

/// Values for a post about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub writer_id: i64,
    pub family_id: i64,
    pub content: String,
    pub images: ImageSlots,
}

/// Hydrated post returned by single-post reads and family pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub post_id: i64,
    /// Writer nickname
    pub writer: String,
    pub profile_img: Option<String>,
    pub content: String,
    pub imgs: ImageSlots,
    pub created_at: DateTime<Utc>,
    pub count_love: i64,
    /// Whether the requesting user loves this post
    pub loved: bool,
}

impl PostView {
    /// View of a post that was just inserted. Nobody can have loved it yet,
    /// so the counters are fixed instead of queried.
    pub fn freshly_created(post: &Post, writer: &User) -> Self {
        Self {
            post_id: post.post_id,
            writer: writer.nickname.clone(),
            profile_img: writer.profile_img.clone(),
            content: post.content.clone(),
            imgs: post.images.clone(),
            created_at: post.created_at,
            count_love: 0,
            loved: false,
        }
    }
}

/// Input for `PostService::create_post`
#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub family_id: i64,
    pub content: String,
    /// Only the first four images are used
    pub images: Vec<ImagePayload>,
}

/// Input for `PostService::edit_post`. `images[i]` targets slot `i`;
/// `None` leaves the slot untouched.
#[derive(Debug, Clone, Default)]
pub struct EditPostRequest {
    pub content: Option<String>,
    pub images: Vec<Option<ImagePayload>>,
}
