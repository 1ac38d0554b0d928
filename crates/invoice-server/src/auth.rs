//! Session Authentication
//!
//! The OAuth provider owns sign-in. We only verify the session JWT it issues
//! (HS256, shared secret), expose the user id/name/email, and keep
//! post-login redirects on our own origin.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header, request::Parts},
};
use cookie::Cookie;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;
use url::Url;

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Cookie holding the session JWT when no bearer header is sent
pub const SESSION_COOKIE: &str = "session-token";

/// Where users land after login when the callback target is foreign
pub const DEFAULT_LANDING_PATH: &str = "/dashboard";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No session token")]
    MissingToken,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Sessions not configured")]
    NotConfigured,
}

/// Claims carried by the provider's session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (provider user id)
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Expiration
    pub exp: i64,
}

/// Signed-in user as exposed to the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl From<SessionClaims> for SessionUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
        }
    }
}

/// Verifies session tokens
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl SessionVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            // Explicit algorithm; tokens signed any other way are rejected
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser, AuthError> {
        decode::<SessionClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// Bearer header first, then the session cookie
fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(token) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    let header = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|t| !t.is_empty())
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<SessionUser, AuthError> {
    let verifier = state.sessions.as_ref().ok_or(AuthError::NotConfigured)?;
    let token = token_from_parts(parts).ok_or(AuthError::MissingToken)?;
    verifier.verify(&token)
}

/// Extractor for handlers that need a signed-in user (401 otherwise)
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).map(CurrentUser).map_err(|e| {
            tracing::debug!(error = %e, "Session rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Not signed in".into(),
                    code: "UNAUTHENTICATED".into(),
                }),
            )
        })
    }
}

/// Extractor for handlers where a session is optional
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).ok()))
    }
}

/// Resolve a post-login callback target
///
/// Relative paths are joined to `base_url`, same-origin URLs pass through,
/// anything else lands on the dashboard.
pub fn resolve_redirect(url: &str, base_url: &str) -> String {
    let trimmed_base = base_url.trim_end_matches('/');

    if url.starts_with('/') && !url.starts_with("//") {
        return format!("{trimmed_base}{url}");
    }

    let same_origin = match (Url::parse(url), Url::parse(base_url)) {
        (Ok(target), Ok(base)) => target.origin().is_tuple() && target.origin() == base.origin(),
        _ => false,
    };
    if same_origin {
        return url.to_string();
    }

    format!("{trimmed_base}{DEFAULT_LANDING_PATH}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const BASE: &str = "http://localhost:3000";

    fn token(secret: &str, sub: &str, exp_offset: i64) -> String {
        let claims = SessionClaims {
            sub: sub.into(),
            name: Some("Ada Lovelace".into()),
            email: Some("ada@example.com".into()),
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_relative_redirect_joins_base() {
        assert_eq!(resolve_redirect("/invoices/new", BASE), "http://localhost:3000/invoices/new");
    }

    #[test]
    fn test_same_origin_redirect_passes_through() {
        assert_eq!(
            resolve_redirect("http://localhost:3000/billing?x=1", BASE),
            "http://localhost:3000/billing?x=1"
        );
    }

    #[test]
    fn test_foreign_redirect_goes_to_dashboard() {
        assert_eq!(
            resolve_redirect("https://evil.example.com/phish", BASE),
            "http://localhost:3000/dashboard"
        );
        assert_eq!(
            resolve_redirect("//evil.example.com", BASE),
            "http://localhost:3000/dashboard"
        );
        assert_eq!(
            resolve_redirect("http://localhost:3000.evil.com/", BASE),
            "http://localhost:3000/dashboard"
        );
    }

    #[test]
    fn test_same_origin_compares_normalized_origins() {
        assert_eq!(
            resolve_redirect("HTTP://LOCALHOST:3000/billing", BASE),
            "HTTP://LOCALHOST:3000/billing"
        );
        assert_eq!(
            resolve_redirect("https://app.example.com:443/x", "https://app.example.com"),
            "https://app.example.com:443/x"
        );
        assert_eq!(
            resolve_redirect("https://app.example.com:8443/x", "https://app.example.com"),
            "https://app.example.com/dashboard"
        );
        assert_eq!(
            resolve_redirect("not a url", BASE),
            "http://localhost:3000/dashboard"
        );
    }

    #[test]
    fn test_session_claims_map_to_user() {
        let verifier = SessionVerifier::new("secret");
        let user = verifier.verify(&token("secret", "google-oauth2|42", 3600)).unwrap();
        assert_eq!(
            user,
            SessionUser {
                id: "google-oauth2|42".into(),
                name: Some("Ada Lovelace".into()),
                email: Some("ada@example.com".into()),
            }
        );
    }

    #[test]
    fn test_expired_or_foreign_tokens_rejected() {
        let verifier = SessionVerifier::new("secret");
        assert!(verifier.verify(&token("secret", "u1", -3600)).is_err());
        assert!(verifier.verify(&token("other", "u1", 3600)).is_err());
        assert!(verifier.verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_token_from_bearer_or_cookie() {
        let req = Request::builder()
            .header("authorization", "Bearer abc")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(token_from_parts(&parts).as_deref(), Some("abc"));

        let req = Request::builder()
            .header("cookie", "theme=dark; session-token=xyz")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(token_from_parts(&parts).as_deref(), Some("xyz"));

        let req = Request::builder()
            .header("cookie", "broken; session-token=abc.def; other=1")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(token_from_parts(&parts).as_deref(), Some("abc.def"));

        let req = Request::builder().body(()).unwrap();
        let (parts, _) = req.into_parts();
        assert_eq!(token_from_parts(&parts), None);
    }
}
