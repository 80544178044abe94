/// Task store abstraction
///
/// [`TaskStore`] is the seam between HTTP handlers and persistence. Every
/// task operation takes a [`Credential`] and resolves the owner from it in
/// the same statement that touches the task, so there is no separate
/// authentication round trip and no way to reach another owner's rows.
///
/// # Implementations
///
/// - [`postgres::PgTaskStore`]: production store backed by a `PgPool`
///
/// # Error mapping
///
/// | Condition                                  | Error                        |
/// |--------------------------------------------|------------------------------|
/// | username already registered                | [`StoreError::UsernameTaken`] |
/// | delete of an unknown user id               | [`StoreError::UserNotFound`]  |
/// | create task with an unmatched credential   | [`StoreError::OwnerNotFound`] |
/// | task missing or owned by someone else      | [`StoreError::TaskNotFound`]  |
/// | query exceeded the per-call deadline       | [`StoreError::Timeout`]       |
///
/// Listing and bulk deletion with an unmatched credential are not errors:
/// they yield an empty list and zero respectively.

pub mod postgres;

use async_trait::async_trait;
use std::time::Duration;

use crate::auth::Credential;
use crate::db::errors::{constraint_violation, ConstraintViolation};
use crate::db::pool::PoolStats;
use crate::models::task::{Task, TaskPatch};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("username {0} already exists")]
    UsernameTaken(String),

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("no account matches the presented credential")]
    OwnerNotFound,

    #[error("task already exists")]
    DuplicateTask,

    #[error("task {0} not found")]
    TaskNotFound(i64),

    #[error("store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Constraint violation behind a database error, if any
    pub fn constraint(&self) -> Option<ConstraintViolation> {
        match self {
            Self::Database(err) => constraint_violation(err),
            _ => None,
        }
    }
}

/// Owner-scoped persistence for accounts and tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Registers an account and returns its id
    async fn create_user(&self, credential: &Credential) -> Result<i64, StoreError>;

    /// Removes an account together with all of its tasks
    async fn delete_user(&self, user_id: i64) -> Result<(), StoreError>;

    /// Creates a task for the matching owner and returns its id
    async fn create_task(&self, owner: &Credential, title: &str) -> Result<i64, StoreError>;

    async fn get_task(&self, owner: &Credential, task_id: i64) -> Result<Task, StoreError>;

    /// Lists the owner's tasks in ascending id order
    async fn list_tasks(&self, owner: &Credential) -> Result<Vec<Task>, StoreError>;

    async fn update_task(
        &self,
        owner: &Credential,
        task_id: i64,
        patch: &TaskPatch,
    ) -> Result<(), StoreError>;

    async fn delete_task(&self, owner: &Credential, task_id: i64) -> Result<(), StoreError>;

    /// Deletes every task of the owner and returns how many were removed
    async fn delete_all_tasks(&self, owner: &Credential) -> Result<u64, StoreError>;

    /// Round trip used by the health endpoint
    async fn ping(&self) -> Result<(), StoreError>;

    /// Connection pool statistics, when the store has a pool
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_only_for_database_errors() {
        assert_eq!(StoreError::OwnerNotFound.constraint(), None);
        assert_eq!(StoreError::Database(sqlx::Error::RowNotFound).constraint(), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            StoreError::UsernameTaken("alice1".to_string()).to_string(),
            "username alice1 already exists"
        );
        assert_eq!(StoreError::TaskNotFound(42).to_string(), "task 42 not found");
        assert_eq!(
            StoreError::Timeout(Duration::from_secs(2)).to_string(),
            "store call exceeded 2s"
        );
    }
}
