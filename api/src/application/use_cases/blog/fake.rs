use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::blog_repository::{BlogRepository, PostFilter, PostPatch};
use crate::application::testing::MemUsers;
use crate::domain::blog::post::{Comment, Post};
use crate::domain::users::user::UserSummary;

pub struct MemBlog {
    people: Vec<UserSummary>,
    posts: Mutex<Vec<Post>>,
    likes: Mutex<Vec<(Uuid, Uuid)>>,
    comments: Mutex<Vec<Comment>>,
    edges: Mutex<Vec<(Uuid, Uuid)>>,
}

impl MemBlog {
    pub fn new(users: &MemUsers) -> Self {
        Self {
            people: users.summaries(),
            posts: Mutex::default(),
            likes: Mutex::default(),
            comments: Mutex::default(),
            edges: Mutex::default(),
        }
    }

    fn person(&self, id: Uuid) -> UserSummary {
        self.people.iter().find(|p| p.id == id).cloned().unwrap()
    }

    fn page<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, i64) {
        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        (items, total)
    }
}

#[async_trait]
impl BlogRepository for MemBlog {
    async fn create_post(
        &self,
        author_id: Uuid,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> anyhow::Result<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            author: self.person(author_id),
            title: title.to_string(),
            body: body.to_string(),
            tags: tags.to_vec(),
            like_count: 0,
            comment_count: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Post>, i64)> {
        let items: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|p| filter.author_id.map_or(true, |a| a == p.author.id))
            .filter(|p| filter.tag.as_ref().map_or(true, |t| p.tags.contains(t)))
            .cloned()
            .collect();
        Ok(Self::page(items, page))
    }

    async fn update_post(&self, id: Uuid, patch: &PostPatch) -> anyhow::Result<Option<Post>> {
        let mut posts = self.posts.lock().unwrap();
        Ok(posts.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(title) = &patch.title {
                p.title = title.clone();
            }
            if let Some(body) = &patch.body {
                p.body = body.clone();
            }
            if let Some(tags) = &patch.tags {
                p.tags = tags.clone();
            }
            p.updated_at = chrono::Utc::now();
            p.clone()
        }))
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        self.comments.lock().unwrap().retain(|c| c.post_id != id);
        Ok(posts.len() != before)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<(bool, i64)> {
        let mut likes = self.likes.lock().unwrap();
        let liked = if likes.contains(&(post_id, user_id)) {
            likes.retain(|l| *l != (post_id, user_id));
            false
        } else {
            likes.push((post_id, user_id));
            true
        };
        let count = likes.iter().filter(|(p, _)| *p == post_id).count() as i64;
        if let Some(p) = self.posts.lock().unwrap().iter_mut().find(|p| p.id == post_id) {
            p.like_count = count;
        }
        Ok((liked, count))
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        parent_id: Option<Uuid>,
        body: &str,
    ) -> anyhow::Result<Comment> {
        let c = Comment {
            id: Uuid::new_v4(),
            post_id,
            author: self.person(author_id),
            parent_id,
            body: body.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.comments.lock().unwrap().push(c.clone());
        if let Some(p) = self.posts.lock().unwrap().iter_mut().find(|p| p.id == post_id) {
            p.comment_count += 1;
        }
        Ok(c)
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.comments.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| c.id != id && c.parent_id != Some(id));
        Ok(comments.len() != before)
    }

    async fn follow(&self, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
        let mut edges = self.edges.lock().unwrap();
        if edges.contains(&(a, b)) {
            return Ok(false);
        }
        edges.push((a, b));
        Ok(true)
    }

    async fn unfollow(&self, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
        let mut edges = self.edges.lock().unwrap();
        let before = edges.len();
        edges.retain(|e| *e != (a, b));
        Ok(edges.len() != before)
    }

    async fn followers(
        &self,
        user: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)> {
        let items: Vec<UserSummary> = self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, b)| *b == user)
            .map(|(a, _)| self.person(*a))
            .collect();
        Ok(Self::page(items, page))
    }

    async fn following(
        &self,
        user: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)> {
        let ids = self.following_ids(user).await?;
        let items: Vec<UserSummary> = ids.into_iter().map(|id| self.person(id)).collect();
        Ok(Self::page(items, page))
    }

    async fn following_ids(&self, user: Uuid) -> anyhow::Result<Vec<Uuid>> {
        Ok(self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| *a == user)
            .map(|(_, b)| *b)
            .collect())
    }

    async fn second_degree(&self, user: Uuid) -> anyhow::Result<Vec<(Uuid, UserSummary)>> {
        let first = self.following_ids(user).await?;
        let edges = self.edges.lock().unwrap().clone();
        Ok(edges
            .iter()
            .filter(|(a, _)| first.contains(a))
            .map(|(a, b)| (*a, self.person(*b)))
            .collect())
    }

    async fn feed(&self, user: Uuid, page: PageRequest) -> anyhow::Result<(Vec<Post>, i64)> {
        let authors = self.following_ids(user).await?;
        let items: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|p| authors.contains(&p.author.id))
            .cloned()
            .collect();
        Ok(Self::page(items, page))
    }
}
