/// Domain models for tasktrack
///
/// # Models
///
/// - `user`: accounts and the username/password input rules
/// - `task`: tasks and the partial-update normalisation
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use tasktrack_shared::models::task::{Task, TaskPatch};
///
/// let mut task = Task::new(1, "buy milk", Utc::now());
/// TaskPatch::new(None, true).apply(&mut task, Utc::now());
///
/// assert!(task.completed);
/// assert!(task.completed_at.is_some());
/// ```

pub mod task;
pub mod user;
