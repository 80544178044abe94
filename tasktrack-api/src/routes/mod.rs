/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `manage`: Account management behind the manager credential
/// - `task`: Single task create, read, update, delete
/// - `tasks`: Task collection listing and bulk deletion
/// - `metrics`: Prometheus exposition

pub mod health;
pub mod manage;
pub mod metrics;
pub mod task;
pub mod tasks;
