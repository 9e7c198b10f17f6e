use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::blog_repository::BlogRepository;
use crate::domain::blog::post::{Comment, can_delete_comment, reply_root};

pub struct Comments<'a, R: BlogRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: BlogRepository + ?Sized> Comments<'a, R> {
    pub async fn comment(&self, actor: Uuid, post_id: Uuid, body: &str) -> ServiceResult<Comment> {
        if self.repo.get_post(post_id).await?.is_none() {
            return Err(ServiceError::NotFound("post"));
        }
        Ok(self.repo.add_comment(post_id, actor, None, body).await?)
    }

    pub async fn reply(&self, actor: Uuid, comment_id: Uuid, body: &str) -> ServiceResult<Comment> {
        let target = self
            .repo
            .get_comment(comment_id)
            .await?
            .ok_or(ServiceError::NotFound("comment"))?;
        let root = reply_root(&target);
        Ok(self
            .repo
            .add_comment(target.post_id, actor, Some(root), body)
            .await?)
    }

    pub async fn delete(&self, actor: Uuid, comment_id: Uuid) -> ServiceResult<()> {
        let comment = self
            .repo
            .get_comment(comment_id)
            .await?
            .ok_or(ServiceError::NotFound("comment"))?;
        let post = self
            .repo
            .get_post(comment.post_id)
            .await?
            .ok_or(ServiceError::NotFound("post"))?;
        if !can_delete_comment(&comment, post.author.id, actor) {
            return Err(ServiceError::forbidden(
                "only the comment author or the post author can delete it",
            ));
        }
        self.repo.delete_comment(comment_id).await?;
        Ok(())
    }
}
