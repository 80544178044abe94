/// PostgreSQL error classification
///
/// Store operations translate constraint violations into domain errors
/// (duplicate username, unknown owner, ...). This module maps the raw SQLSTATE
/// codes so the translation reads by meaning instead of by number.

/// SQLSTATE `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE `not_null_violation`
pub const NOT_NULL_VIOLATION: &str = "23502";

/// Constraint violation kinds the store cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// A unique index rejected the row
    Unique,

    /// A NOT NULL column received NULL
    NotNull,
}

impl ConstraintViolation {
    /// Maps a SQLSTATE code to a violation kind
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            UNIQUE_VIOLATION => Some(Self::Unique),
            NOT_NULL_VIOLATION => Some(Self::NotNull),
            _ => None,
        }
    }
}

/// Returns the constraint violation carried by `err`, if any
pub fn constraint_violation(err: &sqlx::Error) -> Option<ConstraintViolation> {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .and_then(|code| ConstraintViolation::from_code(&code)),
        _ => None,
    }
}
