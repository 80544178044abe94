/// PostgreSQL task store
///
/// Each call runs under `query_timeout`; a call that overruns is abandoned
/// and reported as [`StoreError::Timeout`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tasktrack_shared::auth::Credential;
/// use tasktrack_shared::store::{postgres::PgTaskStore, TaskStore};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let store = PgTaskStore::new(pool, Duration::from_secs(5));
/// let owner = Credential::new("alice1", "5bdcc146...");
///
/// let id = store.create_task(&owner, "buy milk").await?;
/// let task = store.get_task(&owner, id).await?;
/// assert_eq!(task.title, "buy milk");
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::QueryBuilder;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::{StoreError, TaskStore};
use crate::auth::Credential;
use crate::db::errors::ConstraintViolation;
use crate::db::pool::{get_pool_stats, health_check, PoolStats};
use crate::models::task::{Assignment, Task, TaskPatch};

/// Task store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgTaskStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, call).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Store call timed out"
                );
                Err(StoreError::Timeout(self.query_timeout))
            }
        }
    }
}

/// Builds the owner-scoped `UPDATE` for a normalised patch
fn build_update<'a>(
    owner: &'a Credential,
    task_id: i64,
    assignments: Vec<Assignment>,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE tasks SET ");

    {
        let mut set = builder.separated(", ");
        for assignment in assignments {
            set.push(assignment.column());
            match assignment {
                Assignment::Completed(completed) => {
                    set.push_unseparated(" = ");
                    set.push_bind_unseparated(completed);
                }
                Assignment::Title(title) => {
                    set.push_unseparated(" = ");
                    set.push_bind_unseparated(title);
                }
                Assignment::CompletedAtNow | Assignment::UpdatedAtNow => {
                    set.push_unseparated(" = NOW()");
                }
                Assignment::CompletedAtCleared => {
                    set.push_unseparated(" = NULL");
                }
            }
        }
    }

    builder.push(" WHERE owner_id = (SELECT id FROM accounts WHERE username = ");
    builder.push_bind(owner.username.as_str());
    builder.push(" AND credential_hash = ");
    builder.push_bind(owner.credential_hash.as_str());
    builder.push(") AND id = ");
    builder.push_bind(task_id);

    builder
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create_user(&self, credential: &Credential) -> Result<i64, StoreError> {
        let call = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO accounts (username, credential_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&credential.username)
        .bind(&credential.credential_hash)
        .fetch_one(&self.pool);

        let id = self
            .with_deadline("create_user", call)
            .await
            .map_err(|err| match err.constraint() {
                Some(ConstraintViolation::Unique) => {
                    StoreError::UsernameTaken(credential.username.clone())
                }
                _ => err,
            })?;

        debug!(user_id = id, username = %credential.username, "Created user");
        Ok(id)
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError> {
        let call = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool);

        let result = self.with_deadline("delete_user", call).await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::UserNotFound(user_id));
        }

        debug!(user_id, "Deleted user");
        Ok(())
    }

    async fn create_task(&self, owner: &Credential, title: &str) -> Result<i64, StoreError> {
        // an unmatched credential makes the sub-select NULL and trips NOT NULL on owner_id
        let call = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO tasks (owner_id, title, completed, created_at, updated_at)
            VALUES (
                (SELECT id FROM accounts WHERE username = $1 AND credential_hash = $2),
                $3, FALSE, NOW(), NOW()
            )
            RETURNING id
            "#,
        )
        .bind(&owner.username)
        .bind(&owner.credential_hash)
        .bind(title)
        .fetch_one(&self.pool);

        self.with_deadline("create_task", call)
            .await
            .map_err(|err| match err.constraint() {
                Some(ConstraintViolation::NotNull) => StoreError::OwnerNotFound,
                Some(ConstraintViolation::Unique) => StoreError::DuplicateTask,
                None => err,
            })
    }

    async fn get_task(&self, owner: &Credential, task_id: i64) -> Result<Task, StoreError> {
        let call = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.completed, t.created_at, t.updated_at, t.completed_at
            FROM tasks t
            JOIN accounts a ON a.id = t.owner_id
            WHERE a.username = $1 AND a.credential_hash = $2 AND t.id = $3
            "#,
        )
        .bind(&owner.username)
        .bind(&owner.credential_hash)
        .bind(task_id)
        .fetch_optional(&self.pool);

        self.with_deadline("get_task", call)
            .await?
            .ok_or(StoreError::TaskNotFound(task_id))
    }

    async fn list_tasks(&self, owner: &Credential) -> Result<Vec<Task>, StoreError> {
        let call = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.completed, t.created_at, t.updated_at, t.completed_at
            FROM tasks t
            JOIN accounts a ON a.id = t.owner_id
            WHERE a.username = $1 AND a.credential_hash = $2
            ORDER BY t.id ASC
            "#,
        )
        .bind(&owner.username)
        .bind(&owner.credential_hash)
        .fetch_all(&self.pool);

        self.with_deadline("list_tasks", call).await
    }

    async fn update_task(
        &self,
        owner: &Credential,
        task_id: i64,
        patch: &TaskPatch,
    ) -> Result<(), StoreError> {
        let mut builder = build_update(owner, task_id, patch.assignments());
        let call = builder.build().execute(&self.pool);

        let result = self.with_deadline("update_task", call).await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::TaskNotFound(task_id));
        }

        Ok(())
    }

    async fn delete_task(&self, owner: &Credential, task_id: i64) -> Result<(), StoreError> {
        let call = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE owner_id = (SELECT id FROM accounts WHERE username = $1 AND credential_hash = $2)
              AND id = $3
            "#,
        )
        .bind(&owner.username)
        .bind(&owner.credential_hash)
        .bind(task_id)
        .execute(&self.pool);

        let result = self.with_deadline("delete_task", call).await?;
        if result.rows_affected() != 1 {
            return Err(StoreError::TaskNotFound(task_id));
        }

        Ok(())
    }

    async fn delete_all_tasks(&self, owner: &Credential) -> Result<u64, StoreError> {
        let call = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE owner_id = (SELECT id FROM accounts WHERE username = $1 AND credential_hash = $2)
            "#,
        )
        .bind(&owner.username)
        .bind(&owner.credential_hash)
        .execute(&self.pool);

        let result = self.with_deadline("delete_all_tasks", call).await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_deadline("ping", health_check(&self.pool)).await
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        Some(get_pool_stats(&self.pool))
    }
}
