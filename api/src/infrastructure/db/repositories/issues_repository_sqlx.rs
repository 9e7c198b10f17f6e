use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::issues_repository::{
    IssueFilter, IssuesRepository, NewIssue, NewPullRequest,
};
use crate::domain::issues::issue::{Issue, IssueComment, IssueState};
use crate::domain::issues::pull_request::{PullRequest, PullRequestState};
use crate::domain::issues::repository::{Label, Repository};
use crate::domain::issues::timeline::TimelineEvent;
use crate::domain::users::user::UserSummary;
use crate::infrastructure::db::PgPool;

const REPO_SELECT: &str = r#"SELECT r.id, r.name, r.description, r.created_at,
       u.id AS owner_id, u.name AS owner_name
  FROM issue_repositories r JOIN users u ON u.id = r.owner_id"#;

const ISSUE_SELECT: &str = r#"SELECT i.id, i.repository_id, i.number, i.title, i.body, i.state,
       i.created_at, i.updated_at, i.closed_at,
       a.id AS author_id, a.name AS author_name,
       s.id AS assignee_id, s.name AS assignee_name,
       COUNT(*) OVER() AS total
  FROM issues i
  JOIN users a ON a.id = i.author_id
  LEFT JOIN users s ON s.id = i.assignee_id"#;

const PR_SELECT: &str = r#"SELECT p.id, p.repository_id, p.number, p.title, p.body, p.head, p.base,
       p.state, p.created_at, p.updated_at, p.merged_at, p.closed_at,
       a.id AS author_id, a.name AS author_name,
       COUNT(*) OVER() AS total
  FROM pull_requests p JOIN users a ON a.id = p.author_id"#;

pub struct SqlxIssuesRepository {
    pub pool: PgPool,
}

fn person(r: &PgRow, id: &str, name: &str) -> UserSummary {
    UserSummary {
        id: r.get(id),
        name: r.get(name),
    }
}

fn map_repo(r: &PgRow) -> Repository {
    Repository {
        id: r.get("id"),
        owner: person(r, "owner_id", "owner_name"),
        name: r.get("name"),
        description: r.get("description"),
        created_at: r.get("created_at"),
    }
}

fn map_label(r: &PgRow) -> Label {
    Label {
        id: r.get("id"),
        repository_id: r.get("repository_id"),
        name: r.get("name"),
        color: r.get("color"),
    }
}

fn map_issue(r: &PgRow, labels: Vec<Label>) -> anyhow::Result<Issue> {
    let assignee = r
        .get::<Option<Uuid>, _>("assignee_id")
        .map(|id| UserSummary {
            id,
            name: r.get("assignee_name"),
        });
    Ok(Issue {
        id: r.get("id"),
        repository_id: r.get("repository_id"),
        number: r.get("number"),
        author: person(r, "author_id", "author_name"),
        title: r.get("title"),
        body: r.get("body"),
        state: r.get::<String, _>("state").parse::<IssueState>()?,
        assignee,
        labels,
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        closed_at: r.get("closed_at"),
    })
}

fn map_pr(r: &PgRow) -> anyhow::Result<PullRequest> {
    Ok(PullRequest {
        id: r.get("id"),
        repository_id: r.get("repository_id"),
        number: r.get("number"),
        author: person(r, "author_id", "author_name"),
        title: r.get("title"),
        body: r.get("body"),
        head: r.get("head"),
        base: r.get("base"),
        state: r.get::<String, _>("state").parse::<PullRequestState>()?,
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        merged_at: r.get("merged_at"),
        closed_at: r.get("closed_at"),
    })
}

impl SqlxIssuesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn labels_of(&self, issue_ids: &[Uuid]) -> anyhow::Result<Vec<(Uuid, Label)>> {
        let rows = sqlx::query(
            r#"SELECT k.issue_id, l.id, l.repository_id, l.name, l.color
               FROM issue_label_links k JOIN issue_labels l ON l.id = k.label_id
               WHERE k.issue_id = ANY($1)
               ORDER BY l.name"#,
        )
        .bind(issue_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| (r.get("issue_id"), map_label(r)))
            .collect())
    }

    async fn hydrate(&self, rows: &[PgRow]) -> anyhow::Result<Vec<Issue>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();
        let links = self.labels_of(&ids).await?;
        rows.iter()
            .map(|r| {
                let id: Uuid = r.get("id");
                let labels = links
                    .iter()
                    .filter(|(issue, _)| *issue == id)
                    .map(|(_, l)| l.clone())
                    .collect();
                map_issue(r, labels)
            })
            .collect()
    }

    async fn issue_by_id(&self, id: Uuid) -> anyhow::Result<Option<Issue>> {
        let row = sqlx::query(&format!("{ISSUE_SELECT} WHERE i.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(r) => Ok(self.hydrate(&[r]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn pr_by_id(&self, id: Uuid) -> anyhow::Result<Option<PullRequest>> {
        let row = sqlx::query(&format!("{PR_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_pr).transpose()
    }
}

#[async_trait]
impl IssuesRepository for SqlxIssuesRepository {
    async fn create_repository(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Option<Repository>> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"INSERT INTO issue_repositories (owner_id, name, description) VALUES ($1, $2, $3)
               ON CONFLICT (owner_id, name) DO NOTHING RETURNING id"#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        match id {
            Some(id) => self.get_repository(id).await,
            None => Ok(None),
        }
    }

    async fn get_repository(&self, id: Uuid) -> anyhow::Result<Option<Repository>> {
        let row = sqlx::query(&format!("{REPO_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_repo))
    }

    async fn list_repositories(&self, owner_id: Uuid) -> anyhow::Result<Vec<Repository>> {
        let rows = sqlx::query(&format!("{REPO_SELECT} WHERE r.owner_id = $1 ORDER BY r.name"))
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_repo).collect())
    }

    async fn create_label(
        &self,
        repository_id: Uuid,
        name: &str,
        color: &str,
    ) -> anyhow::Result<Option<Label>> {
        let row = sqlx::query(
            r#"INSERT INTO issue_labels (repository_id, name, color) VALUES ($1, $2, $3)
               ON CONFLICT (repository_id, name) DO NOTHING
               RETURNING id, repository_id, name, color"#,
        )
        .bind(repository_id)
        .bind(name)
        .bind(color)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(map_label))
    }

    async fn list_labels(&self, repository_id: Uuid) -> anyhow::Result<Vec<Label>> {
        let rows = sqlx::query(
            "SELECT id, repository_id, name, color FROM issue_labels WHERE repository_id = $1 ORDER BY name",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_label).collect())
    }

    async fn get_label(&self, id: Uuid) -> anyhow::Result<Option<Label>> {
        let row = sqlx::query("SELECT id, repository_id, name, color FROM issue_labels WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_label))
    }

    async fn delete_label(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM issue_labels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn create_issue(&self, issue: &NewIssue) -> anyhow::Result<Issue> {
        let mut tx = self.pool.begin().await?;
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO issues (repository_id, number, author_id, title, body, assignee_id)
               VALUES ($1, $2, $3, $4, $5, $6) RETURNING id"#,
        )
        .bind(issue.repository_id)
        .bind(issue.number)
        .bind(issue.author_id)
        .bind(&issue.title)
        .bind(&issue.body)
        .bind(issue.assignee_id)
        .fetch_one(&mut *tx)
        .await?;
        sqlx::query(
            r#"INSERT INTO issue_label_links (issue_id, label_id)
               SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING"#,
        )
        .bind(id)
        .bind(&issue.label_ids)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        self.issue_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("issue {id} vanished after insert"))
    }

    async fn get_issue(&self, repository_id: Uuid, number: i64) -> anyhow::Result<Option<Issue>> {
        let row = sqlx::query(&format!(
            "{ISSUE_SELECT} WHERE i.repository_id = $1 AND i.number = $2"
        ))
        .bind(repository_id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(r) => Ok(self.hydrate(&[r]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_issues(
        &self,
        repository_id: Uuid,
        filter: &IssueFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Issue>, i64)> {
        let rows = sqlx::query(&format!(
            r#"{ISSUE_SELECT}
               WHERE i.repository_id = $1
                 AND ($2::text IS NULL OR i.state = $2)
                 AND ($3::text IS NULL OR EXISTS (
                       SELECT 1 FROM issue_label_links k JOIN issue_labels l ON l.id = k.label_id
                       WHERE k.issue_id = i.id AND l.name = $3))
               ORDER BY i.number DESC
               LIMIT $4 OFFSET $5"#
        ))
        .bind(repository_id)
        .bind(filter.state.map(|s| s.as_str()))
        .bind(filter.label.as_deref())
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        Ok((self.hydrate(&rows).await?, total))
    }

    async fn update_issue(
        &self,
        id: Uuid,
        title: Option<&str>,
        body: Option<&str>,
    ) -> anyhow::Result<Option<Issue>> {
        sqlx::query(
            r#"UPDATE issues SET title = COALESCE($2, title), body = COALESCE($3, body),
                 updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(title)
        .bind(body)
        .execute(&self.pool)
        .await?;
        self.issue_by_id(id).await
    }

    async fn set_issue_state(&self, id: Uuid, state: IssueState) -> anyhow::Result<Option<Issue>> {
        sqlx::query(
            r#"UPDATE issues SET state = $2, updated_at = now(),
                 closed_at = CASE WHEN $2 = 'closed' THEN now() ELSE NULL END
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(state.as_str())
        .execute(&self.pool)
        .await?;
        self.issue_by_id(id).await
    }

    async fn set_issue_assignee(
        &self,
        id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> anyhow::Result<Option<Issue>> {
        sqlx::query("UPDATE issues SET assignee_id = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(assignee_id)
            .execute(&self.pool)
            .await?;
        self.issue_by_id(id).await
    }

    async fn attach_label(&self, issue_id: Uuid, label_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(
            "INSERT INTO issue_label_links (issue_id, label_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(issue_id)
        .bind(label_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn detach_label(&self, issue_id: Uuid, label_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM issue_label_links WHERE issue_id = $1 AND label_id = $2")
            .bind(issue_id)
            .bind(label_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_comment(
        &self,
        issue_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> anyhow::Result<IssueComment> {
        let row = sqlx::query(
            r#"WITH c AS (
                 INSERT INTO issue_comments (issue_id, author_id, body) VALUES ($1, $2, $3)
                 RETURNING id, issue_id, author_id, body, created_at
               )
               SELECT c.id, c.issue_id, c.body, c.created_at, u.id AS author_id, u.name AS author_name
               FROM c JOIN users u ON u.id = c.author_id"#,
        )
        .bind(issue_id)
        .bind(author_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await?;
        Ok(IssueComment {
            id: row.get("id"),
            issue_id: row.get("issue_id"),
            author: person(&row, "author_id", "author_name"),
            body: row.get("body"),
            created_at: row.get("created_at"),
        })
    }

    async fn list_comments(&self, issue_id: Uuid) -> anyhow::Result<Vec<IssueComment>> {
        let rows = sqlx::query(
            r#"SELECT c.id, c.issue_id, c.body, c.created_at, u.id AS author_id, u.name AS author_name
               FROM issue_comments c JOIN users u ON u.id = c.author_id
               WHERE c.issue_id = $1 ORDER BY c.created_at, c.id"#,
        )
        .bind(issue_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| IssueComment {
                id: r.get("id"),
                issue_id: r.get("issue_id"),
                author: person(r, "author_id", "author_name"),
                body: r.get("body"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    async fn create_pull_request(&self, pr: &NewPullRequest) -> anyhow::Result<PullRequest> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO pull_requests (repository_id, number, author_id, title, body, head, base)
               VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id"#,
        )
        .bind(pr.repository_id)
        .bind(pr.number)
        .bind(pr.author_id)
        .bind(&pr.title)
        .bind(&pr.body)
        .bind(&pr.head)
        .bind(&pr.base)
        .fetch_one(&self.pool)
        .await?;
        self.pr_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("pull request {id} vanished after insert"))
    }

    async fn get_pull_request(
        &self,
        repository_id: Uuid,
        number: i64,
    ) -> anyhow::Result<Option<PullRequest>> {
        let row = sqlx::query(&format!(
            "{PR_SELECT} WHERE p.repository_id = $1 AND p.number = $2"
        ))
        .bind(repository_id)
        .bind(number)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_pr).transpose()
    }

    async fn list_pull_requests(
        &self,
        repository_id: Uuid,
        state: Option<PullRequestState>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<PullRequest>, i64)> {
        let rows = sqlx::query(&format!(
            r#"{PR_SELECT}
               WHERE p.repository_id = $1 AND ($2::text IS NULL OR p.state = $2)
               ORDER BY p.number DESC
               LIMIT $3 OFFSET $4"#
        ))
        .bind(repository_id)
        .bind(state.map(|s| s.as_str()))
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let items = rows.iter().map(map_pr).collect::<anyhow::Result<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn set_pull_request_state(
        &self,
        id: Uuid,
        state: PullRequestState,
    ) -> anyhow::Result<Option<PullRequest>> {
        sqlx::query(
            r#"UPDATE pull_requests SET state = $2, updated_at = now(),
                 merged_at = CASE WHEN $2 = 'merged' THEN now() ELSE merged_at END,
                 closed_at = CASE WHEN $2 = 'open' THEN NULL
                                  WHEN $2 = 'closed' THEN now() ELSE closed_at END
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(state.as_str())
        .execute(&self.pool)
        .await?;
        self.pr_by_id(id).await
    }

    async fn append_event(
        &self,
        subject_id: Uuid,
        actor_id: Uuid,
        kind: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO timeline_events (subject_id, actor_id, kind, message) VALUES ($1, $2, $3, $4)",
        )
        .bind(subject_id)
        .bind(actor_id)
        .bind(kind)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn timeline(&self, subject_id: Uuid) -> anyhow::Result<Vec<TimelineEvent>> {
        let rows = sqlx::query(
            r#"SELECT e.id, e.subject_id, e.kind, e.message, e.created_at,
                      u.id AS actor_id, u.name AS actor_name
               FROM timeline_events e JOIN users u ON u.id = e.actor_id
               WHERE e.subject_id = $1 ORDER BY e.created_at, e.id"#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|r| TimelineEvent {
                id: r.get("id"),
                subject_id: r.get("subject_id"),
                actor: person(r, "actor_id", "actor_name"),
                kind: r.get("kind"),
                message: r.get("message"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
