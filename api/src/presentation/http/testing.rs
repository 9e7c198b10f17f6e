//! Request-level test support: every router over in-memory repositories.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use crate::application::testing::{MemCounters, MemUsers};
use crate::application::use_cases::bank::fake::MemBank;
use crate::application::use_cases::blog::fake::MemBlog;
use crate::application::use_cases::issues::fake::MemIssues;
use crate::application::use_cases::projects::fake::MemProjects;
use crate::application::use_cases::store::fake::MemStore;
use crate::application::use_cases::todo::fake::MemTodos;
use crate::bootstrap::app_context::{AppContext, AppServices};
use crate::bootstrap::config::Config;
use crate::domain::users::user::{Role, User};
use crate::presentation::http::auth::issue_token;

pub struct TestApp {
    pub ctx: AppContext,
    pub users: Vec<User>,
}

impl TestApp {
    pub fn new(names: &[&str]) -> Self {
        let (users, people) = MemUsers::with_users(names);
        let blog = MemBlog::new(&users);
        let issues = MemIssues::new(&users);
        let projects = MemProjects::new(&users);
        let services = AppServices::new(
            Arc::new(users),
            Arc::new(MemCounters::default()),
            Arc::new(MemBank::default()),
            Arc::new(blog),
            Arc::new(MemStore::default()),
            Arc::new(issues),
            Arc::new(projects),
            Arc::new(MemTodos::default()),
        );
        let cfg = Config::from_lookup(|_| None).unwrap();
        Self {
            ctx: AppContext::new(cfg, services),
            users: people,
        }
    }

    /// Bearer token for the n-th seeded user.
    pub fn token(&self, n: usize) -> String {
        issue_token(&self.ctx.cfg, &self.users[n]).unwrap()
    }

    pub fn admin_token(&self, n: usize) -> String {
        let admin = User {
            role: Role::Admin,
            ..self.users[n].clone()
        };
        issue_token(&self.ctx.cfg, &admin).unwrap()
    }
}

/// Sends one request and returns the status with the decoded JSON body
/// (`Null` when the body is empty).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    let req = match body {
        Some(json) => req
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Field names listed in a validation error body.
pub fn error_fields(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errs| {
            errs.iter()
                .filter_map(|e| e["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
