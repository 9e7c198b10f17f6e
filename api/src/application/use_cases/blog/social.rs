use std::collections::HashSet;

use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::blog_repository::BlogRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::domain::blog::post::Post;
use crate::domain::blog::social::{Suggestion, check_follow, rank_suggestions};
use crate::domain::users::user::UserSummary;

pub struct Social<'a, B, U>
where
    B: BlogRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    pub blog: &'a B,
    pub users: &'a U,
}

impl<'a, B, U> Social<'a, B, U>
where
    B: BlogRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    async fn ensure_user(&self, id: Uuid) -> ServiceResult<()> {
        if self.users.find_by_id(id).await?.is_none() {
            return Err(ServiceError::NotFound("user"));
        }
        Ok(())
    }

    pub async fn follow(&self, actor: Uuid, target: Uuid) -> ServiceResult<()> {
        check_follow(actor, target)?;
        self.ensure_user(target).await?;
        if !self.blog.follow(actor, target).await? {
            return Err(ServiceError::conflict("you already follow this user"));
        }
        tracing::debug!(follower = %actor, followee = %target, "follow_created");
        Ok(())
    }

    pub async fn unfollow(&self, actor: Uuid, target: Uuid) -> ServiceResult<()> {
        check_follow(actor, target)?;
        if !self.blog.unfollow(actor, target).await? {
            return Err(ServiceError::NotFound("follow"));
        }
        Ok(())
    }

    pub async fn followers(
        &self,
        user: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Paginated<UserSummary>> {
        self.ensure_user(user).await?;
        let (items, total) = self.blog.followers(user, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn following(
        &self,
        user: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Paginated<UserSummary>> {
        self.ensure_user(user).await?;
        let (items, total) = self.blog.following(user, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    /// Friends-of-friends first; when there are none, a plain listing of
    /// users the caller does not follow yet.
    pub async fn suggestions(
        &self,
        actor: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Paginated<Suggestion>> {
        let following: HashSet<Uuid> = self.blog.following_ids(actor).await?.into_iter().collect();
        let edges = self.blog.second_degree(actor).await?;
        let ranked = rank_suggestions(actor, &following, &edges);
        if !ranked.is_empty() {
            let total = ranked.len() as i64;
            let items = ranked
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect();
            return Ok(Paginated::new(items, page, total));
        }
        let mut exclude: Vec<Uuid> = following.into_iter().collect();
        exclude.push(actor);
        let (users, total) = self.users.list_excluding(&exclude, page).await?;
        let items = users
            .into_iter()
            .map(|user| Suggestion {
                user,
                mutual_count: 0,
            })
            .collect();
        Ok(Paginated::new(items, page, total))
    }

    pub async fn feed(&self, actor: Uuid, page: PageRequest) -> ServiceResult<Paginated<Post>> {
        let (items, total) = self.blog.feed(actor, page).await?;
        Ok(Paginated::new(items, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::MemUsers;
    use crate::application::use_cases::blog::fake::MemBlog;
    use crate::domain::users::user::User;

    fn fixture() -> (MemUsers, MemBlog, Vec<User>) {
        let (users, list) = MemUsers::with_users(&["ann", "bob", "cy", "dee", "eve"]);
        let graph = MemBlog::new(&users);
        (users, graph, list)
    }

    #[tokio::test]
    async fn follow_rules() {
        let (users, graph, u) = fixture();
        let social = Social {
            blog: &graph,
            users: &users,
        };
        assert!(matches!(
            social.follow(u[0].id, u[0].id).await,
            Err(ServiceError::BadRequest(_))
        ));
        assert!(matches!(
            social.follow(u[0].id, Uuid::new_v4()).await,
            Err(ServiceError::NotFound("user"))
        ));
        social.follow(u[0].id, u[1].id).await.unwrap();
        assert!(matches!(
            social.follow(u[0].id, u[1].id).await,
            Err(ServiceError::Conflict(_))
        ));
        let followers = social
            .followers(u[1].id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(followers.total, 1);
        assert_eq!(followers.items[0].name, "ann");
        social.unfollow(u[0].id, u[1].id).await.unwrap();
        assert!(matches!(
            social.unfollow(u[0].id, u[1].id).await,
            Err(ServiceError::NotFound("follow"))
        ));
    }

    #[tokio::test]
    async fn suggests_friends_of_friends() {
        let (users, graph, u) = fixture();
        let social = Social {
            blog: &graph,
            users: &users,
        };
        // ann -> bob, ann -> cy; bob -> dee, cy -> dee, bob -> ann
        social.follow(u[0].id, u[1].id).await.unwrap();
        social.follow(u[0].id, u[2].id).await.unwrap();
        social.follow(u[1].id, u[3].id).await.unwrap();
        social.follow(u[2].id, u[3].id).await.unwrap();
        social.follow(u[1].id, u[0].id).await.unwrap();

        let s = social
            .suggestions(u[0].id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(s.total, 1);
        assert_eq!(s.items[0].user.name, "dee");
        assert_eq!(s.items[0].mutual_count, 2);
    }

    #[tokio::test]
    async fn falls_back_to_user_listing() {
        let (users, graph, u) = fixture();
        let social = Social {
            blog: &graph,
            users: &users,
        };
        social.follow(u[0].id, u[1].id).await.unwrap();
        let s = social
            .suggestions(u[0].id, PageRequest::default())
            .await
            .unwrap();
        let names: Vec<&str> = s.items.iter().map(|x| x.user.name.as_str()).collect();
        assert_eq!(names, vec!["cy", "dee", "eve"]);
        assert!(s.items.iter().all(|x| x.mutual_count == 0));
    }
}
