//! # tasktrack Shared Library
//!
//! Domain types, persistence, and credential handling used by the tasktrack
//! API server.
//!
//! ## Module Organization
//!
//! - `auth`: Basic header parsing and password salting
//! - `db`: connection bootstrap, migrations, and SQLSTATE mapping
//! - `models`: task and account models
//! - `store`: the owner-scoped [`store::TaskStore`] and its PostgreSQL backend

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the tasktrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
