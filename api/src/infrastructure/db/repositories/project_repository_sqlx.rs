use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::ports::project_repository::{
    NewSprint, NewTask, ProjectRepository, TaskFilter, TaskPatch,
};
use crate::domain::projects::project::{JoinRequest, JoinStatus, Member, MemberRole, Project};
use crate::domain::projects::sprint::Sprint;
use crate::domain::projects::task::{Task, TaskStatus};
use crate::domain::users::user::UserSummary;
use crate::infrastructure::db::PgPool;

const PROJECT_COLUMNS: &str = "id, key, name, description, owner_id, created_at";
const SPRINT_COLUMNS: &str = "id, project_id, name, goal, start_date, end_date, status, created_at";

const JOIN_SELECT: &str = r#"SELECT j.id, j.project_id, j.message, j.status, j.created_at, j.decided_at,
       u.id AS user_id, u.name AS user_name
  FROM project_join_requests j JOIN users u ON u.id = j.user_id"#;

const TASK_SELECT: &str = r#"SELECT t.id, t.project_id, t.key, t.title, t.description, t.status,
       t.priority, t.sprint_id, t.created_at, t.updated_at,
       a.id AS assignee_id, a.name AS assignee_name,
       r.id AS reporter_id, r.name AS reporter_name
  FROM project_tasks t
  JOIN users r ON r.id = t.reporter_id
  LEFT JOIN users a ON a.id = t.assignee_id"#;

pub struct SqlxProjectRepository {
    pub pool: PgPool,
}

impl SqlxProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn task_by_id(&self, id: Uuid) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query(&format!("{TASK_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_task).transpose()
    }
}

fn map_project(r: &PgRow) -> Project {
    Project {
        id: r.get("id"),
        key: r.get("key"),
        name: r.get("name"),
        description: r.get("description"),
        owner_id: r.get("owner_id"),
        created_at: r.get("created_at"),
    }
}

fn map_join(r: &PgRow) -> anyhow::Result<JoinRequest> {
    Ok(JoinRequest {
        id: r.get("id"),
        project_id: r.get("project_id"),
        user: UserSummary {
            id: r.get("user_id"),
            name: r.get("user_name"),
        },
        message: r.get("message"),
        status: r.get::<String, _>("status").parse()?,
        created_at: r.get("created_at"),
        decided_at: r.get("decided_at"),
    })
}

fn map_sprint(r: &PgRow) -> anyhow::Result<Sprint> {
    Ok(Sprint {
        id: r.get("id"),
        project_id: r.get("project_id"),
        name: r.get("name"),
        goal: r.get("goal"),
        start_date: r.get("start_date"),
        end_date: r.get("end_date"),
        status: r.get::<String, _>("status").parse()?,
        created_at: r.get("created_at"),
    })
}

fn map_task(r: &PgRow) -> anyhow::Result<Task> {
    let assignee = r
        .get::<Option<Uuid>, _>("assignee_id")
        .map(|id| UserSummary {
            id,
            name: r.get("assignee_name"),
        });
    Ok(Task {
        id: r.get("id"),
        project_id: r.get("project_id"),
        key: r.get("key"),
        title: r.get("title"),
        description: r.get("description"),
        status: r.get::<String, _>("status").parse::<TaskStatus>()?,
        priority: r.get::<String, _>("priority").parse()?,
        sprint_id: r.get("sprint_id"),
        assignee,
        reporter: UserSummary {
            id: r.get("reporter_id"),
            name: r.get("reporter_name"),
        },
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepository {
    async fn create_project(
        &self,
        key: &str,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> anyhow::Result<Option<Project>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            r#"INSERT INTO projects (key, name, description, owner_id) VALUES ($1, $2, $3, $4)
               ON CONFLICT (key) DO NOTHING
               RETURNING {PROJECT_COLUMNS}"#
        ))
        .bind(key)
        .bind(name)
        .bind(description)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let project = map_project(&row);
        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(project.id)
            .bind(owner_id)
            .bind(MemberRole::Owner.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(project))
    }

    async fn get_project(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        let row = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_project))
    }

    async fn list_for_member(&self, user_id: Uuid) -> anyhow::Result<Vec<Project>> {
        let rows = sqlx::query(
            r#"SELECT p.id, p.key, p.name, p.description, p.owner_id, p.created_at
               FROM projects p JOIN project_members m ON m.project_id = p.id
               WHERE m.user_id = $1 ORDER BY p.key"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_project).collect())
    }

    async fn member_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<MemberRole>> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM project_members WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        role.map(|r| r.parse()).transpose()
    }

    async fn list_members(&self, project_id: Uuid) -> anyhow::Result<Vec<Member>> {
        let rows = sqlx::query(
            r#"SELECT m.role, m.joined_at, u.id, u.name
               FROM project_members m JOIN users u ON u.id = m.user_id
               WHERE m.project_id = $1 ORDER BY m.joined_at, u.name"#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|r| {
                Ok(Member {
                    user: UserSummary {
                        id: r.get("id"),
                        name: r.get("name"),
                    },
                    role: r.get::<String, _>("role").parse()?,
                    joined_at: r.get("joined_at"),
                })
            })
            .collect()
    }

    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;
        let res = sqlx::query(
            "DELETE FROM project_members WHERE project_id = $1 AND user_id = $2 AND role <> 'owner'",
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(false);
        }
        sqlx::query(
            r#"UPDATE project_tasks SET assignee_id = NULL, updated_at = now()
               WHERE project_id = $1 AND assignee_id = $2"#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> anyhow::Result<Option<JoinRequest>> {
        // the partial unique index allows one pending request per user and project
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"INSERT INTO project_join_requests (project_id, user_id, message) VALUES ($1, $2, $3)
               ON CONFLICT DO NOTHING
               RETURNING id"#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(message)
        .fetch_optional(&self.pool)
        .await?;
        match id {
            Some(id) => self.get_join_request(id).await,
            None => Ok(None),
        }
    }

    async fn get_join_request(&self, id: Uuid) -> anyhow::Result<Option<JoinRequest>> {
        let row = sqlx::query(&format!("{JOIN_SELECT} WHERE j.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_join).transpose()
    }

    async fn list_join_requests(
        &self,
        project_id: Uuid,
        status: Option<JoinStatus>,
    ) -> anyhow::Result<Vec<JoinRequest>> {
        let rows = sqlx::query(&format!(
            r#"{JOIN_SELECT}
               WHERE j.project_id = $1 AND ($2::text IS NULL OR j.status = $2)
               ORDER BY j.created_at"#
        ))
        .bind(project_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_join).collect()
    }

    async fn decide_join_request(
        &self,
        id: Uuid,
        status: JoinStatus,
    ) -> anyhow::Result<Option<JoinRequest>> {
        let mut tx = self.pool.begin().await?;
        let decided = sqlx::query(
            r#"UPDATE project_join_requests SET status = $2, decided_at = now()
               WHERE id = $1 AND status = 'pending'
               RETURNING project_id, user_id"#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = decided else {
            tx.rollback().await?;
            return Ok(None);
        };
        if status == JoinStatus::Approved {
            sqlx::query(
                r#"INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3)
                   ON CONFLICT DO NOTHING"#,
            )
            .bind(row.get::<Uuid, _>("project_id"))
            .bind(row.get::<Uuid, _>("user_id"))
            .bind(MemberRole::Member.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        self.get_join_request(id).await
    }

    async fn create_sprint(&self, sprint: &NewSprint) -> anyhow::Result<Sprint> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO sprints (project_id, name, goal, start_date, end_date)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {SPRINT_COLUMNS}"#
        ))
        .bind(sprint.project_id)
        .bind(&sprint.name)
        .bind(sprint.goal.as_deref())
        .bind(sprint.start_date)
        .bind(sprint.end_date)
        .fetch_one(&self.pool)
        .await?;
        map_sprint(&row)
    }

    async fn get_sprint(&self, id: Uuid) -> anyhow::Result<Option<Sprint>> {
        let row = sqlx::query(&format!("SELECT {SPRINT_COLUMNS} FROM sprints WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_sprint).transpose()
    }

    async fn list_sprints(&self, project_id: Uuid) -> anyhow::Result<Vec<Sprint>> {
        let rows = sqlx::query(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE project_id = $1 ORDER BY start_date, created_at"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_sprint).collect()
    }

    async fn active_sprint(&self, project_id: Uuid) -> anyhow::Result<Option<Sprint>> {
        let row = sqlx::query(&format!(
            "SELECT {SPRINT_COLUMNS} FROM sprints WHERE project_id = $1 AND status = 'active'"
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_sprint).transpose()
    }

    async fn start_sprint(&self, id: Uuid) -> anyhow::Result<Option<Sprint>> {
        let res = sqlx::query(&format!(
            r#"UPDATE sprints SET status = 'active'
               WHERE id = $1 AND status = 'planned'
                 AND NOT EXISTS (
                     SELECT 1 FROM sprints o
                      WHERE o.project_id = sprints.project_id AND o.status = 'active')
               RETURNING {SPRINT_COLUMNS}"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        match res {
            Ok(row) => row.as_ref().map(map_sprint).transpose(),
            // a concurrent start committed first and tripped sprints_one_active_idx
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn complete_sprint(&self, id: Uuid) -> anyhow::Result<Option<(Sprint, u64)>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            r#"UPDATE sprints SET status = 'completed'
               WHERE id = $1 AND status = 'active'
               RETURNING {SPRINT_COLUMNS}"#
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let moved = sqlx::query(
            r#"UPDATE project_tasks SET sprint_id = NULL, updated_at = now()
               WHERE sprint_id = $1 AND status <> 'done'"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tx.commit().await?;
        Ok(Some((map_sprint(&row)?, moved)))
    }

    async fn create_task(&self, task: &NewTask) -> anyhow::Result<Task> {
        let id: Uuid = sqlx::query_scalar(
            r#"INSERT INTO project_tasks
                 (project_id, key, title, description, priority, sprint_id, assignee_id, reporter_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id"#,
        )
        .bind(task.project_id)
        .bind(&task.key)
        .bind(&task.title)
        .bind(task.description.as_deref())
        .bind(task.priority.as_str())
        .bind(task.sprint_id)
        .bind(task.assignee_id)
        .bind(task.reporter_id)
        .fetch_one(&self.pool)
        .await?;
        self.task_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("task {id} vanished after insert"))
    }

    async fn get_task(&self, project_id: Uuid, key: &str) -> anyhow::Result<Option<Task>> {
        let row = sqlx::query(&format!(
            "{TASK_SELECT} WHERE t.project_id = $1 AND t.key = $2"
        ))
        .bind(project_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_task).transpose()
    }

    async fn list_tasks(&self, project_id: Uuid, filter: &TaskFilter) -> anyhow::Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            r#"{TASK_SELECT}
               WHERE t.project_id = $1
                 AND ($2::text IS NULL OR t.status = $2)
                 AND ($3::uuid IS NULL OR t.sprint_id = $3)
                 AND (NOT $4 OR t.sprint_id IS NULL)
                 AND ($5::uuid IS NULL OR t.assignee_id = $5)
               ORDER BY t.created_at, t.key"#
        ))
        .bind(project_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.sprint_id)
        .bind(filter.backlog_only)
        .bind(filter.assignee_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_task).collect()
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>> {
        let res = sqlx::query(
            r#"UPDATE project_tasks SET
                 title = COALESCE($2, title),
                 description = CASE WHEN $3 THEN $4 ELSE description END,
                 status = COALESCE($5, status),
                 priority = COALESCE($6, priority),
                 sprint_id = CASE WHEN $7 THEN $8 ELSE sprint_id END,
                 assignee_id = CASE WHEN $9 THEN $10 ELSE assignee_id END,
                 updated_at = now()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.description.is_some())
        .bind(patch.description.clone().flatten())
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.sprint_id.is_some())
        .bind(patch.sprint_id.flatten())
        .bind(patch.assignee_id.is_some())
        .bind(patch.assignee_id.flatten())
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Ok(None);
        }
        self.task_by_id(id).await
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM project_tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
