use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::blog_repository::{BlogRepository, PostFilter, PostPatch};
use crate::domain::blog::post::{Comment, Post};
use crate::domain::users::user::UserSummary;
use crate::infrastructure::db::PgPool;

const POST_SELECT: &str = r#"SELECT p.id, p.title, p.body, p.tags, p.like_count, p.comment_count,
       p.created_at, p.updated_at, u.id AS author_id, u.name AS author_name,
       COUNT(*) OVER() AS total
  FROM blog_posts p JOIN users u ON u.id = p.author_id"#;

const COMMENT_SELECT: &str = r#"SELECT c.id, c.post_id, c.parent_id, c.body, c.created_at,
       u.id AS author_id, u.name AS author_name
  FROM blog_comments c JOIN users u ON u.id = c.author_id"#;

pub struct SqlxBlogRepository {
    pub pool: PgPool,
}

impl SqlxBlogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn page_of_posts(
        &self,
        sql: &str,
        first: Option<Uuid>,
        tag: Option<&str>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Post>, i64)> {
        let rows = sqlx::query(sql)
            .bind(first)
            .bind(tag)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        Ok((rows.iter().map(map_post).collect(), total))
    }

    async fn page_of_people(
        &self,
        sql: &str,
        user_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)> {
        let rows = sqlx::query(sql)
            .bind(user_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let items = rows
            .iter()
            .map(|r| UserSummary {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect();
        Ok((items, total))
    }
}

fn map_post(r: &PgRow) -> Post {
    Post {
        id: r.get("id"),
        author: UserSummary {
            id: r.get("author_id"),
            name: r.get("author_name"),
        },
        title: r.get("title"),
        body: r.get("body"),
        tags: r.get("tags"),
        like_count: r.get("like_count"),
        comment_count: r.get("comment_count"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

fn map_comment(r: &PgRow) -> Comment {
    Comment {
        id: r.get("id"),
        post_id: r.get("post_id"),
        author: UserSummary {
            id: r.get("author_id"),
            name: r.get("author_name"),
        },
        parent_id: r.get("parent_id"),
        body: r.get("body"),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create_post(
        &self,
        author_id: Uuid,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> anyhow::Result<Post> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO blog_posts (author_id, title, body, tags) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(author_id)
        .bind(title)
        .bind(body)
        .bind(tags)
        .fetch_one(&self.pool)
        .await?;
        self.get_post(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("post {id} vanished after insert"))
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_post))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Post>, i64)> {
        let sql = format!(
            r#"{POST_SELECT}
               WHERE ($1::uuid IS NULL OR p.author_id = $1)
                 AND ($2::text IS NULL OR $2 = ANY(p.tags))
               ORDER BY p.created_at DESC, p.id
               LIMIT $3 OFFSET $4"#
        );
        self.page_of_posts(&sql, filter.author_id, filter.tag.as_deref(), page)
            .await
    }

    async fn update_post(&self, id: Uuid, patch: &PostPatch) -> anyhow::Result<Option<Post>> {
        let res = sqlx::query(
            r#"UPDATE blog_posts SET
                 title = COALESCE($2, title),
                 body = COALESCE($3, body),
                 tags = COALESCE($4, tags),
                 updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.body.as_deref())
        .bind(patch.tags.as_deref())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> anyhow::Result<(bool, i64)> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM blog_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;
        if !removed {
            sqlx::query(
                "INSERT INTO blog_likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        let count: i64 = sqlx::query_scalar(
            r#"UPDATE blog_posts
               SET like_count = (SELECT COUNT(*) FROM blog_likes WHERE post_id = $1)
               WHERE id = $1
               RETURNING like_count"#,
        )
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok((!removed, count))
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        parent_id: Option<Uuid>,
        body: &str,
    ) -> anyhow::Result<Comment> {
        let mut tx = self.pool.begin().await?;
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO blog_comments (post_id, author_id, parent_id, body) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(parent_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query("UPDATE blog_posts SET comment_count = comment_count + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        let row = sqlx::query(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(map_comment(&row))
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_comment))
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at, c.id"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_comment).collect())
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let post_id: Option<Uuid> =
            sqlx::query_scalar("SELECT post_id FROM blog_comments WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(post_id) = post_id else {
            return Ok(false);
        };
        let removed = sqlx::query("DELETE FROM blog_comments WHERE id = $1 OR parent_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected() as i64;
        sqlx::query(
            "UPDATE blog_posts SET comment_count = GREATEST(comment_count - $2, 0) WHERE id = $1",
        )
        .bind(post_id)
        .bind(removed)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(removed > 0)
    }

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "INSERT INTO blog_follows (follower_id, followee_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM blog_follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn followers(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)> {
        self.page_of_people(
            r#"SELECT u.id, u.name, COUNT(*) OVER() AS total
               FROM blog_follows f JOIN users u ON u.id = f.follower_id
               WHERE f.followee_id = $1
               ORDER BY u.name, u.id LIMIT $2 OFFSET $3"#,
            user_id,
            page,
        )
        .await
    }

    async fn following(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)> {
        self.page_of_people(
            r#"SELECT u.id, u.name, COUNT(*) OVER() AS total
               FROM blog_follows f JOIN users u ON u.id = f.followee_id
               WHERE f.follower_id = $1
               ORDER BY u.name, u.id LIMIT $2 OFFSET $3"#,
            user_id,
            page,
        )
        .await
    }

    async fn following_ids(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar("SELECT followee_id FROM blog_follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn second_degree(&self, user_id: Uuid) -> anyhow::Result<Vec<(Uuid, UserSummary)>> {
        let rows = sqlx::query(
            r#"SELECT f1.followee_id AS via, u.id, u.name
               FROM blog_follows f1
               JOIN blog_follows f2 ON f2.follower_id = f1.followee_id
               JOIN users u ON u.id = f2.followee_id
               WHERE f1.follower_id = $1"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| {
                (
                    r.get("via"),
                    UserSummary {
                        id: r.get("id"),
                        name: r.get("name"),
                    },
                )
            })
            .collect())
    }

    async fn feed(&self, user_id: Uuid, page: PageRequest) -> anyhow::Result<(Vec<Post>, i64)> {
        let sql = format!(
            r#"{POST_SELECT}
               WHERE p.author_id IN (SELECT followee_id FROM blog_follows WHERE follower_id = $1)
                 AND ($2::text IS NULL OR $2 = ANY(p.tags))
               ORDER BY p.created_at DESC, p.id
               LIMIT $3 OFFSET $4"#
        );
        self.page_of_posts(&sql, Some(user_id), None, page).await
    }
}
