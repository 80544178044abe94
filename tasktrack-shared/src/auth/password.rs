/// Deterministic password salting
///
/// Credentials are matched inside SQL by exact equality on
/// `(username, credential_hash)`, so the stored form of a password must be a
/// pure function of the password. A per-deployment secret key is mixed in
/// with HMAC-SHA256 and the result is stored as lowercase hex.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::password::PasswordSalter;
///
/// let salter = PasswordSalter::new("deployment-secret");
/// let stored = salter.salt("Secret1!");
///
/// assert_eq!(stored.len(), 64);
/// assert_eq!(stored, salter.salt("Secret1!"));
/// assert!(salter.verify("Secret1!", &stored));
/// assert!(!salter.verify("secret1!", &stored));
/// ```

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use super::{BasicCredentials, Credential};

type HmacSha256 = Hmac<Sha256>;

/// Turns plaintext passwords into stored credential hashes
#[derive(Clone)]
pub struct PasswordSalter {
    mac: HmacSha256,
}

impl fmt::Debug for PasswordSalter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordSalter").finish_non_exhaustive()
    }
}

impl PasswordSalter {
    /// Creates a salter keyed with the deployment secret
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        let mac = HmacSha256::new_from_slice(key.as_ref())
            .expect("HMAC can take key of any size");

        Self { mac }
    }

    /// Returns the stored form of `password`
    pub fn salt(&self, password: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(password.as_bytes());

        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks `password` against a stored hash in constant time
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let Ok(expected) = hex::decode(stored_hash) else {
            return false;
        };

        let mut mac = self.mac.clone();
        mac.update(password.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Converts presented Basic credentials into a store credential
    pub fn credential(&self, presented: &BasicCredentials) -> Credential {
        Credential {
            username: presented.username.clone(),
            credential_hash: self.salt(&presented.password),
        }
    }
}
