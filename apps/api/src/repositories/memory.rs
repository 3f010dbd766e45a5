//! In-memory store implementing both repository traits
//!
//! [`MemoryStore`] keeps users and posts behind one `Arc<RwLock<..>>`, so
//! clones share state. Uniqueness checks and inserts happen under the same
//! write lock, which gives concurrent `create` calls the same
//! exactly-one-wins outcome as the database's unique indexes.
//!
//! Poisoned locks are recovered with `unwrap_or_else(|e| e.into_inner())` so
//! a panicking test does not cascade into unrelated failures.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::post::PostRepository;
use super::user::UserRepository;
use super::utils::normalize_email;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewPost, NewUser, Post, PostChanges, PostUpdate, User, DEFAULT_STATUS};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    /// Posts in insertion order
    posts: Vec<Post>,
}

impl MemoryState {
    /// Posts newest first. Ties on `created_at` go to the later insert.
    fn posts_newest_first(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.iter().rev().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    /// Whether a post other than `except` stores exactly `image_url`
    fn image_taken(&self, image_url: Option<&str>, except: Option<Uuid>) -> bool {
        let Some(image_url) = image_url else {
            return false;
        };
        self.posts
            .iter()
            .any(|p| Some(p.id) != except && p.image_url.as_deref() == Some(image_url))
    }
}

/// Lock-protected in-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn user_count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.users.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> ApiResult<User> {
        let email = normalize_email(&user.email);
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        if state.users.values().any(|u| u.email == email) {
            return Err(ApiError::DuplicateEmail(email));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email,
            password_hash: user.password_hash,
            status: DEFAULT_STATUS.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, user_id: Uuid) -> ApiResult<Option<User>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.users.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let email = normalize_email(email);
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_status(&self, user_id: Uuid, status: &str) -> ApiResult<Option<User>> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        Ok(state.users.get_mut(&user_id).map(|user| {
            user.status = status.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn ping(&self) -> ApiResult<()> {
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> ApiResult<Post> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.image_taken(post.image_url.as_deref(), None) {
            return Err(ApiError::image_taken());
        }

        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            creator_id: post.creator_id,
            created_at: now,
            updated_at: now,
        };
        state.posts.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, post_id: Uuid) -> ApiResult<Option<Post>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.posts.iter().find(|p| p.id == post_id).cloned())
    }

    async fn find_page(&self, limit: i64, offset: i64) -> ApiResult<Vec<Post>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .posts_newest_first()
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> ApiResult<i64> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.posts.len() as i64)
    }

    async fn find_by_creator(&self, creator_id: Uuid) -> ApiResult<Vec<Post>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .posts_newest_first()
            .into_iter()
            .filter(|p| p.creator_id == creator_id)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        post_id: Uuid,
        changes: PostChanges,
    ) -> ApiResult<Option<PostUpdate>> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.image_taken(changes.image_url.as_deref(), Some(post_id)) {
            return Err(ApiError::image_taken());
        }

        let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) else {
            return Ok(None);
        };
        let previous_image_url = std::mem::replace(&mut post.image_url, changes.image_url);
        post.title = changes.title;
        post.content = changes.content;
        post.updated_at = Utc::now();

        Ok(Some(PostUpdate {
            post: post.clone(),
            previous_image_url,
        }))
    }

    async fn delete(&self, post_id: Uuid) -> ApiResult<bool> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let before = state.posts.len();
        state.posts.retain(|p| p.id != post_id);
        Ok(state.posts.len() < before)
    }

    async fn image_in_use(&self, image_urls: &[String], except: Option<Uuid>) -> ApiResult<bool> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        Ok(state.posts.iter().filter(|p| Some(p.id) != except).any(|p| {
            p.image_url
                .as_ref()
                .is_some_and(|url| image_urls.iter().any(|candidate| candidate == url))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_post(creator_id: Uuid, title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "content".to_string(),
            image_url: None,
            creator_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let store = MemoryStore::new();
        UserRepository::create(&store, new_user("ada@example.com"))
            .await
            .unwrap();
        let err = UserRepository::create(&store, new_user("ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEmail(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn test_new_user_gets_default_status() {
        let store = MemoryStore::new();
        let user = UserRepository::create(&store, new_user("grace@example.com"))
            .await
            .unwrap();
        assert_eq!(user.status, DEFAULT_STATUS);
    }

    #[tokio::test]
    async fn test_page_is_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        for title in ["one", "two", "three"] {
            PostRepository::create(&store, new_post(owner, title))
                .await
                .unwrap();
        }

        let page = store.find_page(2, 0).await.unwrap();
        let titles: Vec<_> = page.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two"]);

        let rest = store.find_page(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "one");
        assert!(store.find_page(2, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_in_use() {
        let store = MemoryStore::new();
        let mut post = new_post(Uuid::new_v4(), "pic");
        post.image_url = Some("image/a.png".to_string());
        let created = PostRepository::create(&store, post).await.unwrap();
        let a = ["image/a.png".to_string()];

        assert!(store.image_in_use(&a, None).await.unwrap());
        assert!(!store.image_in_use(&a, Some(created.id)).await.unwrap());
        assert!(!store
            .image_in_use(&["image/b.png".to_string()], None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_image_rejected() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let mut first = new_post(owner, "first");
        first.image_url = Some("image/a.png".to_string());
        PostRepository::create(&store, first.clone()).await.unwrap();

        let err = PostRepository::create(&store, first).await.unwrap_err();
        assert_eq!(err.data().unwrap()[0]["field"], "imageUrl");

        let other = PostRepository::create(&store, new_post(owner, "other"))
            .await
            .unwrap();
        let changes = PostChanges {
            title: "other".to_string(),
            content: "content".to_string(),
            image_url: Some("image/a.png".to_string()),
        };
        assert!(matches!(
            store.update(other.id, changes).await,
            Err(ApiError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_reports_previous_image() {
        let store = MemoryStore::new();
        let mut post = new_post(Uuid::new_v4(), "pic");
        post.image_url = Some("image/a.png".to_string());
        let created = PostRepository::create(&store, post).await.unwrap();

        let changes = PostChanges {
            title: "pic".to_string(),
            content: "edited".to_string(),
            image_url: Some("image/b.png".to_string()),
        };
        let update = store.update(created.id, changes).await.unwrap().unwrap();
        assert_eq!(update.previous_image_url.as_deref(), Some("image/a.png"));
        assert_eq!(update.post.image_url.as_deref(), Some("image/b.png"));
        assert_eq!(update.post.content, "edited");

        // Keeping the same image is not a conflict with itself
        let again = PostChanges {
            title: "pic".to_string(),
            content: "again".to_string(),
            image_url: Some("image/b.png".to_string()),
        };
        let update = store.update(created.id, again).await.unwrap().unwrap();
        assert_eq!(update.previous_image_url.as_deref(), Some("image/b.png"));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_post() {
        let store = MemoryStore::new();
        let changes = PostChanges {
            title: "t".to_string(),
            content: "c".to_string(),
            image_url: None,
        };
        assert!(store.update(Uuid::new_v4(), changes).await.unwrap().is_none());
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());
    }
}
