//! Authorization policy and basic-auth gate.
//!
//! Every request passes through [`policy_middleware`] before any handler
//! runs. The policy is an ordered route table evaluated first-match-wins;
//! authentication itself is stateless and re-verifies the basic-auth
//! credentials against the store on every call.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::db::User;
use crate::services::AccountError;

pub const ROLE_ADMIN: &str = "ADMIN";

/// What a route demands before its handler may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Role(&'static str),
}

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Pattern {
    fn matches(self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => path == p,
            Pattern::Prefix(p) => path.starts_with(p),
        }
    }
}

/// Ordered route table, evaluated first-match-wins. Unlisted routes fall
/// through to the authenticated catch-all in [`requirement_for`].
const ACCESS_RULES: &[(Pattern, Requirement)] = &[
    (Pattern::Exact("/users"), Requirement::Role(ROLE_ADMIN)),
    (Pattern::Exact("/api"), Requirement::Public),
    (Pattern::Exact("/register"), Requirement::Public),
    (Pattern::Exact("/forgetPassword"), Requirement::Public),
    (Pattern::Prefix("/admin/"), Requirement::Role(ROLE_ADMIN)),
    (Pattern::Exact("/delete"), Requirement::Authenticated),
];

#[must_use]
pub fn requirement_for(path: &str) -> Requirement {
    ACCESS_RULES
        .iter()
        .find(|(pattern, _)| pattern.matches(path))
        .map_or(Requirement::Authenticated, |&(_, requirement)| requirement)
}

/// The authenticated caller, passed to handlers as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub roles: Vec<String>,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            roles: user.roles,
        }
    }
}

impl CurrentUser {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Policy gate applied to the whole router. Rejects with 401 (missing or
/// bad credentials) or 403 (authenticated, wrong role) before the account
/// service handler is invoked.
pub async fn policy_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let requirement = requirement_for(request.uri().path());

    if requirement == Requirement::Public {
        return Ok(next.run(request).await);
    }

    let Some((username, password)) = basic_credentials(request.headers()) else {
        return Err(ApiError::Unauthorized("Missing credentials".to_string()));
    };

    let user = match state.accounts().authenticate(&username, &password).await {
        Ok(user) => user,
        Err(AccountError::InvalidCredentials) => {
            return Err(ApiError::Unauthorized("Invalid Credentials".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let current = CurrentUser::from(user);

    if let Requirement::Role(role) = requirement
        && !current.has_role(role)
    {
        return Err(ApiError::Forbidden("Access Denied".to_string()));
    }

    request.extensions_mut().insert(current);

    Ok(next.run(request).await)
}

/// Extract username and password from an `Authorization: Basic` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_policy_table_ordering() {
        assert_eq!(requirement_for("/api"), Requirement::Public);
        assert_eq!(requirement_for("/register"), Requirement::Public);
        assert_eq!(requirement_for("/forgetPassword"), Requirement::Public);
        assert_eq!(requirement_for("/users"), Requirement::Role(ROLE_ADMIN));
        assert_eq!(
            requirement_for("/admin/reset/alice"),
            Requirement::Role(ROLE_ADMIN)
        );
        assert_eq!(requirement_for("/delete"), Requirement::Authenticated);
    }

    #[test]
    fn test_unlisted_routes_require_authentication() {
        assert_eq!(requirement_for("/"), Requirement::Authenticated);
        assert_eq!(requirement_for("/api/extra"), Requirement::Authenticated);
        assert_eq!(requirement_for("/registerx"), Requirement::Authenticated);
    }

    #[test]
    fn test_basic_credentials() {
        let mut headers = HeaderMap::new();
        // "bob:pw1"
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic Ym9iOnB3MQ=="),
        );
        assert_eq!(
            basic_credentials(&headers),
            Some(("bob".to_string(), "pw1".to_string()))
        );
    }

    #[test]
    fn test_basic_credentials_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer sometoken"),
        );
        assert_eq!(basic_credentials(&headers), None);
        assert_eq!(basic_credentials(&HeaderMap::new()), None);
    }

    #[test]
    fn test_basic_credentials_malformed_payload() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic not-base64!!"),
        );
        assert_eq!(basic_credentials(&headers), None);

        // Valid base64 but no colon separator
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic Ym9icHcx"),
        );
        assert_eq!(basic_credentials(&headers), None);
    }

    #[test]
    fn test_has_role() {
        let user = CurrentUser {
            id: 1,
            username: "admin".to_string(),
            roles: vec!["ADMIN".to_string()],
        };
        assert!(user.has_role(ROLE_ADMIN));
        assert!(!user.has_role("AUDITOR"));
    }
}
