use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::blog::post::{Comment, Post};
use crate::domain::users::user::UserSummary;

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create_post(
        &self,
        author_id: Uuid,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> anyhow::Result<Post>;
    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Post>, i64)>;
    async fn update_post(&self, id: Uuid, patch: &PostPatch) -> anyhow::Result<Option<Post>>;
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Flips the like of `user_id`; returns whether it is now liked and the new count.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<(bool, i64)>;

    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        parent_id: Option<Uuid>,
        body: &str,
    ) -> anyhow::Result<Comment>;
    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    /// Oldest first.
    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    /// Removes the comment and its replies.
    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Returns false when the edge already existed.
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> anyhow::Result<bool>;
    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> anyhow::Result<bool>;
    async fn followers(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)>;
    async fn following(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)>;
    async fn following_ids(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>>;
    /// `(via, candidate)` pairs where `user_id` follows `via` and `via` follows `candidate`.
    async fn second_degree(&self, user_id: Uuid) -> anyhow::Result<Vec<(Uuid, UserSummary)>>;
    async fn feed(&self, user_id: Uuid, page: PageRequest) -> anyhow::Result<(Vec<Post>, i64)>;
}
