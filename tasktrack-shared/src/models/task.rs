/// Task model and partial-update normalisation
///
/// A task belongs to exactly one account. Every read and write is scoped to
/// the owner resolved from `(username, credential_hash)`, so a task that
/// exists under another owner is indistinguishable from a missing one.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     owner_id BIGINT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     title TEXT NOT NULL CHECK (char_length(title) <= 200),
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     completed_at TIMESTAMPTZ
/// );
/// ```
///
/// # Partial updates
///
/// A [`TaskPatch`] is turned into an ordered list of [`Assignment`]s:
///
/// ```text
/// always                 completed   = <patch.completed>
/// title present, ≠ ""    title       = <patch.title>
/// completed = true       completed_at = NOW()
/// completed = false      updated_at   = NOW(), completed_at = NULL
/// ```
///
/// The store renders the list as one `UPDATE` with bound parameters; the
/// in-memory form is [`TaskPatch::apply`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum title length in Unicode code points
pub const MAX_TITLE_LENGTH: usize = 200;

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Store-assigned task ID
    pub id: i64,

    /// Short description, at most [`MAX_TITLE_LENGTH`] characters
    pub title: String,

    /// Completion flag
    pub completed: bool,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// Last time the task was reopened or created
    pub updated_at: DateTime<Utc>,

    /// When the task was completed, cleared on reopen
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a freshly created task the way the store initialises one
    pub fn new(id: i64, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Requested change to an existing task
///
/// `completed` is mandatory. An absent or empty `title` leaves the title
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: bool,
}

/// One column assignment produced from a [`TaskPatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Completed(bool),
    Title(String),
    CompletedAtNow,
    CompletedAtCleared,
    UpdatedAtNow,
}

impl Assignment {
    /// Column written by this assignment
    pub fn column(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Title(_) => "title",
            Self::CompletedAtNow | Self::CompletedAtCleared => "completed_at",
            Self::UpdatedAtNow => "updated_at",
        }
    }
}

impl TaskPatch {
    pub fn new(title: Option<String>, completed: bool) -> Self {
        Self { title, completed }
    }

    /// Normalises the patch into the assignments to perform, in order
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut assignments = vec![Assignment::Completed(self.completed)];

        if let Some(title) = self.title.as_deref().filter(|t| !t.is_empty()) {
            assignments.push(Assignment::Title(title.to_string()));
        }

        if self.completed {
            assignments.push(Assignment::CompletedAtNow);
        } else {
            assignments.push(Assignment::UpdatedAtNow);
            assignments.push(Assignment::CompletedAtCleared);
        }

        assignments
    }

    /// Applies the patch to a task held in memory, with `now` as the clock
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) {
        for assignment in self.assignments() {
            match assignment {
                Assignment::Completed(completed) => task.completed = completed,
                Assignment::Title(title) => task.title = title,
                Assignment::CompletedAtNow => task.completed_at = Some(now),
                Assignment::CompletedAtCleared => task.completed_at = None,
                Assignment::UpdatedAtNow => task.updated_at = now,
            }
        }
    }
}
