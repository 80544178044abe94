/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: deterministic password salting
///
/// A request presents [`BasicCredentials`], taken from the
/// `Authorization: Basic` header by the API layer. They are salted into a
/// [`Credential`], which is what the task store matches rows against.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::{password::PasswordSalter, BasicCredentials};
///
/// let salter = PasswordSalter::new("deployment-secret");
/// let presented = BasicCredentials::new("alice1", "Secret1!");
/// let credential = salter.credential(&presented);
///
/// assert_eq!(credential.username, "alice1");
/// assert_ne!(credential.credential_hash, "Secret1!");
/// ```

pub mod password;

use std::fmt;

/// Username and plaintext password as presented by a client
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Username and salted password, the key every owner-scoped query uses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Credential {
    pub username: String,
    pub credential_hash: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, credential_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            credential_hash: credential_hash.into(),
        }
    }
}
