/// Database layer for tasktrack
///
/// # Modules
///
/// - `pool`: startup connection with bounded retry, pool sizing, health checks
/// - `migrations`: embedded schema migrations
/// - `errors`: SQLSTATE classification used by the store

pub mod errors;
pub mod migrations;
pub mod pool;
