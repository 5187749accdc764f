use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::UserCredential;

/// Checks usernames and passwords against configured SHA-256 hashes.
pub struct CredentialStore {
    users: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(users: &[UserCredential]) -> Self {
        Self {
            users: users
                .iter()
                .map(|u| (u.username.clone(), u.password_sha256.to_ascii_lowercase()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        match self.users.get(username) {
            Some(expected) => constant_time_eq(hash_password(password).as_bytes(), expected.as_bytes()),
            None => false,
        }
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Decode an `Authorization: Basic <base64(user:pass)>` header value.
pub fn parse_basic_auth(header: &str) -> Result<(String, String)> {
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))
        .ok_or_else(|| AppError::Unauthorized("Unsupported authorization scheme".to_string()))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| AppError::Unauthorized("Malformed basic credentials".to_string()))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| AppError::Unauthorized("Credentials are not UTF-8".to_string()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| AppError::Unauthorized("Malformed basic credentials".to_string()))?;
    Ok((username.to_string(), password.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
