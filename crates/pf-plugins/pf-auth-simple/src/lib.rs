//! # pf-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! A single admin account whose password is stored as a PHC hash string.

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use pf_core::traits::AuthProvider;
use tracing::warn;

pub struct SimpleAuthProvider {
    username: String,
    /// `None` locks the admin area entirely
    password_hash: Option<String>,
}

impl SimpleAuthProvider {
    pub fn new(username: &str, password_hash: Option<String>) -> Self {
        if password_hash.is_none() {
            warn!("no admin password hash configured, admin routes are locked");
        }
        Self {
            username: username.to_string(),
            password_hash,
        }
    }
}

/// Produces a PHC string suitable for `admin.password_hash`.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// Verifies if a provided password matches the stored Argon2 hash.
    async fn verify_admin(&self, username: &str, password: &str) -> bool {
        let Some(hash) = self.password_hash.as_deref() else {
            return false;
        };

        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "configured admin password hash is malformed");
                return false;
            }
        };

        // The hash is checked for every username so a wrong name costs the same.
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();
        let username_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        password_ok & username_ok
    }
}
