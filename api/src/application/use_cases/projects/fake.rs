use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::project_repository::{
    NewSprint, NewTask, ProjectRepository, TaskFilter, TaskPatch,
};
use crate::application::testing::MemUsers;
use crate::domain::projects::project::{JoinRequest, JoinStatus, Member, MemberRole, Project};
use crate::domain::projects::sprint::{Sprint, SprintStatus};
use crate::domain::projects::task::{Task, TaskStatus};
use crate::domain::users::user::UserSummary;

pub struct MemProjects {
    people: Vec<UserSummary>,
    projects: Mutex<Vec<Project>>,
    members: Mutex<Vec<(Uuid, Uuid, MemberRole)>>,
    requests: Mutex<Vec<JoinRequest>>,
    sprints: Mutex<Vec<Sprint>>,
    tasks: Mutex<Vec<Task>>,
    stale_active_reads: AtomicBool,
}

impl MemProjects {
    pub fn new(users: &MemUsers) -> Self {
        Self {
            people: users.summaries(),
            projects: Mutex::default(),
            members: Mutex::default(),
            requests: Mutex::default(),
            sprints: Mutex::default(),
            tasks: Mutex::default(),
            stale_active_reads: AtomicBool::new(false),
        }
    }

    /// Makes `active_sprint` report nothing, as a read racing a concurrent start would.
    pub fn hide_active_sprints(&self) {
        self.stale_active_reads.store(true, Ordering::SeqCst);
    }

    pub fn add_member(&self, project_id: Uuid, user_id: Uuid) {
        self.members
            .lock()
            .unwrap()
            .push((project_id, user_id, MemberRole::Member));
    }

    fn person(&self, id: Uuid) -> UserSummary {
        self.people.iter().find(|p| p.id == id).cloned().unwrap()
    }
}

#[async_trait]
impl ProjectRepository for MemProjects {
    async fn create_project(
        &self,
        key: &str,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> anyhow::Result<Option<Project>> {
        let mut projects = self.projects.lock().unwrap();
        if projects.iter().any(|p| p.key == key) {
            return Ok(None);
        }
        let p = Project {
            id: Uuid::new_v4(),
            key: key.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            owner_id,
            created_at: chrono::Utc::now(),
        };
        projects.push(p.clone());
        self.members
            .lock()
            .unwrap()
            .push((p.id, owner_id, MemberRole::Owner));
        Ok(Some(p))
    }
    async fn get_project(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        Ok(self.projects.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }
    async fn list_for_member(&self, _: Uuid) -> anyhow::Result<Vec<Project>> {
        unimplemented!()
    }
    async fn member_role(&self, project_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<MemberRole>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|(p, u, _)| *p == project_id && *u == user_id)
            .map(|(_, _, r)| *r))
    }
    async fn list_members(&self, project_id: Uuid) -> anyhow::Result<Vec<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| *p == project_id)
            .map(|(_, u, r)| Member {
                user: self.person(*u),
                role: *r,
                joined_at: chrono::Utc::now(),
            })
            .collect())
    }
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let mut members = self.members.lock().unwrap();
        let before = members.len();
        members.retain(|(p, u, r)| {
            !(*p == project_id && *u == user_id && *r != MemberRole::Owner)
        });
        if members.len() == before {
            return Ok(false);
        }
        for t in self.tasks.lock().unwrap().iter_mut() {
            if t.project_id == project_id && t.assignee.as_ref().is_some_and(|a| a.id == user_id) {
                t.assignee = None;
            }
        }
        Ok(true)
    }
    async fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> anyhow::Result<Option<JoinRequest>> {
        let mut requests = self.requests.lock().unwrap();
        if requests.iter().any(|r| {
            r.project_id == project_id && r.user.id == user_id && r.status == JoinStatus::Pending
        }) {
            return Ok(None);
        }
        let r = JoinRequest {
            id: Uuid::new_v4(),
            project_id,
            user: self.person(user_id),
            message: message.map(str::to_string),
            status: JoinStatus::Pending,
            created_at: chrono::Utc::now(),
            decided_at: None,
        };
        requests.push(r.clone());
        Ok(Some(r))
    }
    async fn get_join_request(&self, id: Uuid) -> anyhow::Result<Option<JoinRequest>> {
        Ok(self.requests.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }
    async fn list_join_requests(
        &self,
        project_id: Uuid,
        status: Option<JoinStatus>,
    ) -> anyhow::Result<Vec<JoinRequest>> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.project_id == project_id && status.map_or(true, |s| s == r.status))
            .cloned()
            .collect())
    }
    async fn decide_join_request(&self, id: Uuid, status: JoinStatus) -> anyhow::Result<Option<JoinRequest>> {
        let decided = {
            let mut requests = self.requests.lock().unwrap();
            let Some(r) = requests
                .iter_mut()
                .find(|r| r.id == id && r.status == JoinStatus::Pending)
            else {
                return Ok(None);
            };
            r.status = status;
            r.decided_at = Some(chrono::Utc::now());
            r.clone()
        };
        if status == JoinStatus::Approved {
            self.add_member(decided.project_id, decided.user.id);
        }
        Ok(Some(decided))
    }
    async fn create_sprint(&self, n: &NewSprint) -> anyhow::Result<Sprint> {
        let s = Sprint {
            id: Uuid::new_v4(),
            project_id: n.project_id,
            name: n.name.clone(),
            goal: n.goal.clone(),
            start_date: n.start_date,
            end_date: n.end_date,
            status: SprintStatus::Planned,
            created_at: chrono::Utc::now(),
        };
        self.sprints.lock().unwrap().push(s.clone());
        Ok(s)
    }
    async fn get_sprint(&self, id: Uuid) -> anyhow::Result<Option<Sprint>> {
        Ok(self.sprints.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }
    async fn list_sprints(&self, _: Uuid) -> anyhow::Result<Vec<Sprint>> {
        unimplemented!()
    }
    async fn active_sprint(&self, project_id: Uuid) -> anyhow::Result<Option<Sprint>> {
        if self.stale_active_reads.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self
            .sprints
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.project_id == project_id && s.status == SprintStatus::Active)
            .cloned())
    }
    async fn start_sprint(&self, id: Uuid) -> anyhow::Result<Option<Sprint>> {
        let mut sprints = self.sprints.lock().unwrap();
        let Some(project_id) = sprints
            .iter()
            .find(|s| s.id == id && s.status == SprintStatus::Planned)
            .map(|s| s.project_id)
        else {
            return Ok(None);
        };
        if sprints
            .iter()
            .any(|s| s.project_id == project_id && s.status == SprintStatus::Active)
        {
            return Ok(None);
        }
        Ok(sprints.iter_mut().find(|s| s.id == id).map(|s| {
            s.status = SprintStatus::Active;
            s.clone()
        }))
    }
    async fn complete_sprint(&self, id: Uuid) -> anyhow::Result<Option<(Sprint, u64)>> {
        let sprint = {
            let mut sprints = self.sprints.lock().unwrap();
            let Some(s) = sprints
                .iter_mut()
                .find(|s| s.id == id && s.status == SprintStatus::Active)
            else {
                return Ok(None);
            };
            s.status = SprintStatus::Completed;
            s.clone()
        };
        let mut moved = 0;
        for t in self.tasks.lock().unwrap().iter_mut() {
            if t.sprint_id == Some(id) && t.status != TaskStatus::Done {
                t.sprint_id = None;
                moved += 1;
            }
        }
        Ok(Some((sprint, moved)))
    }
    async fn create_task(&self, n: &NewTask) -> anyhow::Result<Task> {
        let t = Task {
            id: Uuid::new_v4(),
            project_id: n.project_id,
            key: n.key.clone(),
            title: n.title.clone(),
            description: n.description.clone(),
            status: TaskStatus::Todo,
            priority: n.priority,
            sprint_id: n.sprint_id,
            assignee: n.assignee_id.map(|a| self.person(a)),
            reporter: self.person(n.reporter_id),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.tasks.lock().unwrap().push(t.clone());
        Ok(t)
    }
    async fn get_task(&self, project_id: Uuid, key: &str) -> anyhow::Result<Option<Task>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.project_id == project_id && t.key == key)
            .cloned())
    }
    async fn list_tasks(&self, _: Uuid, _: &TaskFilter) -> anyhow::Result<Vec<Task>> {
        unimplemented!()
    }
    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>> {
        let assignee = patch.assignee_id.map(|a| a.map(|id| self.person(id)));
        let mut tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter_mut().find(|t| t.id == id).map(|t| {
            if let Some(title) = &patch.title {
                t.title = title.clone();
            }
            if let Some(d) = &patch.description {
                t.description = d.clone();
            }
            if let Some(s) = patch.status {
                t.status = s;
            }
            if let Some(p) = patch.priority {
                t.priority = p;
            }
            if let Some(s) = patch.sprint_id {
                t.sprint_id = s;
            }
            if let Some(a) = assignee {
                t.assignee = a;
            }
            t.clone()
        }))
    }
    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }
}
