//! In-memory fakes for moments-service integration tests
//!
//! `InMemoryStore` implements both repositories. A transaction works on a
//! copy of the store and replaces it on commit, so dropping an uncommitted
//! transaction leaves the store untouched. `FakeImageStore` validates
//! payloads, hands out deterministic URLs and can be told to fail for a
//! given file name.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use image_store::{ImagePayload, ImageStore, ImageStoreError};
use moments_service::db::{PostRepository, PostTransaction, UserRepository};
use moments_service::models::{ImageSlots, NewPost, Post, PostStatus, PostView, User};
use moments_service::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct StoreState {
    users: HashMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    /// (post_id, user_id)
    loves: BTreeSet<(i64, i64)>,
    last_post_id: i64,
}

impl StoreState {
    fn view(&self, user_id: i64, post: &Post) -> Option<PostView> {
        let writer = self.users.get(&post.writer_id)?;
        Some(PostView {
            post_id: post.post_id,
            writer: writer.nickname.clone(),
            profile_img: writer.profile_img.clone(),
            content: post.content.clone(),
            imgs: post.images.clone(),
            created_at: post.created_at,
            count_love: post.count_love,
            loved: self.loves.contains(&(post.post_id, user_id)),
        })
    }

    fn page(
        &self,
        family_id: i64,
        user_id: i64,
        before_post_id: Option<i64>,
        limit: i64,
    ) -> Vec<PostView> {
        self.posts
            .values()
            .rev()
            .filter(|post| post.family_id == family_id && post.is_active())
            .filter(|post| before_post_id.map_or(true, |before| post.post_id < before))
            .filter_map(|post| self.view(user_id, post))
            .take(limit as usize)
            .collect()
    }

    fn post_mut(&mut self, post_id: i64) -> Option<&mut Post> {
        self.posts.get_mut(&post_id)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
    refresh_calls: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
    open_transactions: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: i64, nickname: &str) -> User {
        let user = User {
            user_id,
            nickname: nickname.to_string(),
            profile_img: Some(format!("https://cdn.test/profiles/{}.png", user_id)),
        };
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user_id, user.clone());
        user
    }

    /// Insert an ACTIVE post without going through a service
    pub fn seed_post(&self, writer_id: i64, family_id: i64, content: &str, urls: &[&str]) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.last_post_id += 1;
        let post_id = state.last_post_id;
        state.posts.insert(
            post_id,
            Post {
                post_id,
                writer_id,
                family_id,
                content: content.to_string(),
                images: ImageSlots::from_urls(urls.iter().map(|url| url.to_string())),
                count_love: 0,
                status: PostStatus::Active,
                created_at: Utc::now() + Duration::milliseconds(post_id),
            },
        );
        post_id
    }

    /// Record a love without touching the stored love count
    pub fn seed_love(&self, post_id: i64, user_id: i64) {
        self.state.lock().unwrap().loves.insert((post_id, user_id));
    }

    pub fn post(&self, post_id: i64) -> Option<Post> {
        self.state.lock().unwrap().posts.get(&post_id).cloned()
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().unwrap().posts.len()
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Transactions begun and not yet committed or dropped
    pub fn open_transactions(&self) -> usize {
        self.open_transactions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn PostTransaction>> {
        let working = self.state.lock().unwrap().clone();
        self.open_transactions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryTransaction {
            store: self.clone(),
            working,
        }))
    }

    async fn find_page_by_family(
        &self,
        family_id: i64,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .page(family_id, user_id, None, limit))
    }

    async fn find_page_by_family_before(
        &self,
        family_id: i64,
        user_id: i64,
        before_post_id: i64,
        limit: i64,
    ) -> Result<Vec<PostView>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .page(family_id, user_id, Some(before_post_id), limit))
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, user_id: i64) -> Result<Option<User>> {
        Ok(self.state.lock().unwrap().users.get(&user_id).cloned())
    }
}

pub struct InMemoryTransaction {
    store: InMemoryStore,
    working: StoreState,
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        self.store.open_transactions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PostTransaction for InMemoryTransaction {
    async fn insert(&mut self, post: NewPost) -> Result<Post> {
        self.working.last_post_id += 1;
        let post_id = self.working.last_post_id;
        let stored = Post {
            post_id,
            writer_id: post.writer_id,
            family_id: post.family_id,
            content: post.content,
            images: post.images,
            count_love: 0,
            status: PostStatus::Active,
            created_at: Utc::now(),
        };
        self.working.posts.insert(post_id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&mut self, post_id: i64) -> Result<Option<Post>> {
        Ok(self.working.posts.get(&post_id).cloned())
    }

    async fn update_content(&mut self, post_id: i64, content: &str) -> Result<()> {
        if let Some(post) = self.working.post_mut(post_id) {
            post.content = content.to_string();
        }
        Ok(())
    }

    async fn update_image(&mut self, post_id: i64, slot: usize, url: &str) -> Result<()> {
        if let Some(post) = self.working.post_mut(post_id) {
            post.images.set(slot, url);
        }
        Ok(())
    }

    async fn set_inactive(&mut self, post_id: i64) -> Result<()> {
        if let Some(post) = self.working.post_mut(post_id) {
            post.status = PostStatus::Inactive;
        }
        Ok(())
    }

    async fn refresh_love_count(&mut self, post_id: i64) -> Result<()> {
        self.store.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let count = self
            .working
            .loves
            .iter()
            .filter(|(loved_post, _)| *loved_post == post_id)
            .count() as i64;
        if let Some(post) = self.working.post_mut(post_id) {
            post.count_love = count;
        }
        Ok(())
    }

    async fn find_single_view(&mut self, user_id: i64, post_id: i64) -> Result<Option<PostView>> {
        Ok(self
            .working
            .posts
            .get(&post_id)
            .filter(|post| post.is_active())
            .and_then(|post| self.working.view(user_id, post)))
    }

    async fn insert_love(&mut self, post_id: i64, user_id: i64) -> Result<bool> {
        Ok(self.working.loves.insert((post_id, user_id)))
    }

    async fn delete_love(&mut self, post_id: i64, user_id: i64) -> Result<bool> {
        Ok(self.working.loves.remove(&(post_id, user_id)))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        let working = std::mem::take(&mut this.working);
        *this.store.state.lock().unwrap() = working;
        this.store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub const FAKE_MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Image store returning `https://cdn.test/{file_name}` for every upload
#[derive(Default)]
pub struct FakeImageStore {
    fail_on: Mutex<Option<String>>,
    uploads: AtomicUsize,
    /// Open-transaction counter of the store under test, sampled on upload
    watched: Option<Arc<AtomicUsize>>,
    max_open_during_upload: AtomicUsize,
}

impl FakeImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record how many store transactions are open whenever an upload runs
    pub fn watching(store: &InMemoryStore) -> Self {
        Self {
            watched: Some(store.open_transactions.clone()),
            ..Self::default()
        }
    }

    pub fn max_open_transactions_during_upload(&self) -> usize {
        self.max_open_during_upload.load(Ordering::SeqCst)
    }

    /// Make uploads of `file_name` fail
    pub fn fail_on(&self, file_name: &str) {
        *self.fail_on.lock().unwrap() = Some(file_name.to_string());
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn url_for(file_name: &str) -> String {
        format!("https://cdn.test/{}", file_name)
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn upload_one(&self, image: ImagePayload) -> image_store::Result<String> {
        image.validate(FAKE_MAX_IMAGE_BYTES)?;

        if let Some(open) = &self.watched {
            self.max_open_during_upload
                .fetch_max(open.load(Ordering::SeqCst), Ordering::SeqCst);
        }

        if self.fail_on.lock().unwrap().as_deref() == Some(image.file_name.as_str()) {
            return Err(ImageStoreError::Upload(format!(
                "{}: simulated outage",
                image.file_name
            )));
        }

        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(Self::url_for(&image.file_name))
    }
}

pub fn jpeg(file_name: &str) -> ImagePayload {
    ImagePayload::new(file_name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}
