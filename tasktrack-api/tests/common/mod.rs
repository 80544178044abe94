//! Common test utilities for integration tests
//!
//! - [`MemoryStore`]: an in-memory [`TaskStore`] with the same owner scoping
//!   as the PostgreSQL store
//! - [`TestContext`]: the fully layered router over a fresh `MemoryStore`
//!
//! Three titles trigger failure paths: [`PANIC_TITLE`] panics inside the
//! store, [`TIMEOUT_TITLE`] reports a deadline overrun and [`SLOW_TITLE`]
//! stalls for longer than the request deadline.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum_extra::headers::{Authorization, HeaderMapExt};
use bytes::Bytes;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tasktrack_api::app::{build_router, AppState};
use tasktrack_api::config::Config;
use tasktrack_shared::auth::Credential;
use tasktrack_shared::models::task::{Task, TaskPatch};
use tasktrack_shared::store::{StoreError, TaskStore};
use tower::Service as _;

pub const MANAGER_USERNAME: &str = "admin";
pub const MANAGER_PASSWORD: &str = "admin-pass";

pub const PANIC_TITLE: &str = "__panic__";
pub const TIMEOUT_TITLE: &str = "__timeout__";
pub const SLOW_TITLE: &str = "__slow__";

/// Renders an `Authorization: Basic` header value
pub fn basic_auth(username: &str, password: &str) -> String {
    let mut headers = HeaderMap::new();
    headers.typed_insert(Authorization::basic(username, password));
    headers[header::AUTHORIZATION].to_str().unwrap().to_string()
}

struct Account {
    id: i64,
    credential: Credential,
}

struct StoredTask {
    owner_id: i64,
    task: Task,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    tasks: Vec<StoredTask>,
    next_user_id: i64,
    next_task_id: i64,
}

impl Inner {
    fn owner_id(&self, credential: &Credential) -> Option<i64> {
        self.accounts
            .iter()
            .find(|account| account.credential == *credential)
            .map(|account| account.id)
    }

    fn owned_task_mut(&mut self, credential: &Credential, task_id: i64) -> Option<&mut Task> {
        let owner_id = self.owner_id(credential)?;
        self.tasks
            .iter_mut()
            .find(|stored| stored.owner_id == owner_id && stored.task.id == task_id)
            .map(|stored| &mut stored.task)
    }
}

/// In-memory task store
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn task_count(&self) -> usize {
        self.inner.lock().unwrap().tasks.len()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_user(&self, credential: &Credential) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if inner
            .accounts
            .iter()
            .any(|account| account.credential.username == credential.username)
        {
            return Err(StoreError::UsernameTaken(credential.username.clone()));
        }

        inner.next_user_id += 1;
        let id = inner.next_user_id;
        inner.accounts.push(Account {
            id,
            credential: credential.clone(),
        });

        Ok(id)
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let before = inner.accounts.len();
        inner.accounts.retain(|account| account.id != user_id);
        if inner.accounts.len() == before {
            return Err(StoreError::UserNotFound(user_id));
        }

        inner.tasks.retain(|stored| stored.owner_id != user_id);
        Ok(())
    }

    async fn create_task(&self, owner: &Credential, title: &str) -> Result<i64, StoreError> {
        if title == PANIC_TITLE {
            panic!("store exploded");
        }
        if title == TIMEOUT_TITLE {
            return Err(StoreError::Timeout(Duration::from_secs(5)));
        }
        if title == SLOW_TITLE {
            tokio::time::sleep(Duration::from_secs(600)).await;
        }

        let mut inner = self.inner.lock().unwrap();
        let owner_id = inner.owner_id(owner).ok_or(StoreError::OwnerNotFound)?;

        inner.next_task_id += 1;
        let id = inner.next_task_id;
        inner.tasks.push(StoredTask {
            owner_id,
            task: Task::new(id, title, Utc::now()),
        });

        Ok(id)
    }

    async fn get_task(&self, owner: &Credential, task_id: i64) -> Result<Task, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        inner
            .owned_task_mut(owner, task_id)
            .map(|task| task.clone())
            .ok_or(StoreError::TaskNotFound(task_id))
    }

    async fn list_tasks(&self, owner: &Credential) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.lock().unwrap();

        let Some(owner_id) = inner.owner_id(owner) else {
            return Ok(Vec::new());
        };

        let mut tasks: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|stored| stored.owner_id == owner_id)
            .map(|stored| stored.task.clone())
            .collect();
        tasks.sort_by_key(|task| task.id);

        Ok(tasks)
    }

    async fn update_task(
        &self,
        owner: &Credential,
        task_id: i64,
        patch: &TaskPatch,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let task = inner
            .owned_task_mut(owner, task_id)
            .ok_or(StoreError::TaskNotFound(task_id))?;
        patch.apply(task, Utc::now());

        Ok(())
    }

    async fn delete_task(&self, owner: &Credential, task_id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let owner_id = inner
            .owner_id(owner)
            .ok_or(StoreError::TaskNotFound(task_id))?;
        let before = inner.tasks.len();
        inner
            .tasks
            .retain(|stored| !(stored.owner_id == owner_id && stored.task.id == task_id));

        if inner.tasks.len() == before {
            return Err(StoreError::TaskNotFound(task_id));
        }
        Ok(())
    }

    async fn delete_all_tasks(&self, owner: &Credential) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let Some(owner_id) = inner.owner_id(owner) else {
            return Ok(0);
        };

        let before = inner.tasks.len();
        inner.tasks.retain(|stored| stored.owner_id != owner_id);

        Ok((before - inner.tasks.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Response pieces collected by [`TestContext::send`]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }
}

/// Test context containing the router and its backing store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.manage_username = MANAGER_USERNAME.to_string();
        config.server.manage_password = MANAGER_PASSWORD.to_string();
        config.security.password_salt = "test-salt".to_string();

        let store = Arc::new(MemoryStore::default());
        let state = AppState::new(store.clone(), config).expect("metrics registration");
        let app = build_router(state.clone());

        Self { app, store, state }
    }

    pub fn manager_auth() -> String {
        basic_auth(MANAGER_USERNAME, MANAGER_PASSWORD)
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<String>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::CONTENT_LENGTH, body.len())
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Creates an account through the management API and returns its id
    pub async fn create_user(&self, username: &str, password: &str) -> i64 {
        let body = serde_json::json!({ "username": username, "password": password });
        let response = self
            .send(
                "POST",
                "/manage/user",
                Some(&Self::manager_auth()),
                Some(body.to_string()),
            )
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "create user failed");
        response.json()["userId"].as_i64().unwrap()
    }

    /// Creates a task and returns its id
    pub async fn create_task(&self, auth: &str, title: &str) -> i64 {
        let body = serde_json::json!({ "title": title });
        let response = self
            .send("POST", "/task", Some(auth), Some(body.to_string()))
            .await;

        assert_eq!(response.status, StatusCode::CREATED, "create task failed");
        response.json()["taskId"].as_i64().unwrap()
    }
}
