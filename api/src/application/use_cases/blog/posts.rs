use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::blog_repository::{BlogRepository, PostFilter, PostPatch};
use crate::domain::blog::post::{CommentThread, Post, build_threads, normalize_tags};

pub struct Posts<'a, R: BlogRepository + ?Sized> {
    pub repo: &'a R,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    pub comments: Vec<CommentThread>,
}

impl<'a, R: BlogRepository + ?Sized> Posts<'a, R> {
    pub async fn create(
        &self,
        author_id: Uuid,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> ServiceResult<Post> {
        let tags = normalize_tags(tags)?;
        let post = self
            .repo
            .create_post(author_id, title.trim(), body, &tags)
            .await?;
        tracing::info!(post_id = %post.id, author_id = %author_id, "post_created");
        Ok(post)
    }

    pub async fn list(&self, filter: PostFilter, page: PageRequest) -> ServiceResult<Paginated<Post>> {
        let filter = PostFilter {
            tag: filter.tag.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()),
            ..filter
        };
        let (items, total) = self.repo.list_posts(&filter, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<PostDetail> {
        let post = self
            .repo
            .get_post(id)
            .await?
            .ok_or(ServiceError::NotFound("post"))?;
        let comments = build_threads(self.repo.list_comments(id).await?);
        Ok(PostDetail { post, comments })
    }

    async fn load_authored(&self, actor: Uuid, id: Uuid) -> ServiceResult<Post> {
        let post = self
            .repo
            .get_post(id)
            .await?
            .ok_or(ServiceError::NotFound("post"))?;
        if post.author.id != actor {
            return Err(ServiceError::forbidden("only the author can change this post"));
        }
        Ok(post)
    }

    pub async fn update(&self, actor: Uuid, id: Uuid, mut patch: PostPatch) -> ServiceResult<Post> {
        self.load_authored(actor, id).await?;
        if let Some(tags) = patch.tags.take() {
            patch.tags = Some(normalize_tags(&tags)?);
        }
        patch.title = patch.title.map(|t| t.trim().to_string());
        self.repo
            .update_post(id, &patch)
            .await?
            .ok_or(ServiceError::NotFound("post"))
    }

    pub async fn delete(&self, actor: Uuid, id: Uuid) -> ServiceResult<()> {
        self.load_authored(actor, id).await?;
        if !self.repo.delete_post(id).await? {
            return Err(ServiceError::NotFound("post"));
        }
        tracing::info!(post_id = %id, "post_deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, actor: Uuid, id: Uuid) -> ServiceResult<(bool, i64)> {
        if self.repo.get_post(id).await?.is_none() {
            return Err(ServiceError::NotFound("post"));
        }
        Ok(self.repo.toggle_like(id, actor).await?)
    }
}
