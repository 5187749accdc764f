use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest};
use serde::Deserialize;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::security::credentials::{parse_basic_auth, CredentialStore};

/// Where a caller may present credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPolicy {
    /// `Authorization: Basic` header only.
    HeaderOnly,
    /// Header first; `?username=&password=` only when no header is sent.
    /// Used for report links opened directly in a browser.
    HeaderOrQuery,
}

#[derive(Deserialize)]
struct QueryCredentials {
    username: Option<String>,
    password: Option<String>,
}

/// Resolve the calling user or fail with `AppError::Unauthorized`.
///
/// A present but invalid header is final; it never falls back to the query.
pub fn authenticate(
    req: &HttpRequest,
    store: &CredentialStore,
    policy: CredentialPolicy,
) -> Result<String> {
    if let Some(value) = req.headers().get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
        let (username, password) = parse_basic_auth(value)?;
        return check(store, username, &password);
    }

    if policy == CredentialPolicy::HeaderOrQuery {
        if let Ok(query) = web::Query::<QueryCredentials>::from_query(req.query_string()) {
            let QueryCredentials { username, password } = query.into_inner();
            if let (Some(username), Some(password)) = (username, password) {
                return check(store, username, &password);
            }
        }
    }

    Err(AppError::Unauthorized("Missing credentials".to_string()))
}

fn check(store: &CredentialStore, username: String, password: &str) -> Result<String> {
    if store.verify(&username, password) {
        Ok(username)
    } else {
        Err(AppError::Unauthorized("Invalid credentials".to_string()))
    }
}
