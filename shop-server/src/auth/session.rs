//! Session tokens for the management API
//!
//! A session is an HS256 JWT carried in the `auth` cookie (or a `Bearer`
//! header for non-browser clients).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::HeaderMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "auth";

/// JWT claims of a signed-in user
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: String,
    /// Restaurant managed by the user, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated identity extracted from the session
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user_id: String,
    pub restaurant_id: Option<String>,
}

impl SessionIdentity {
    /// Restaurant scope of the caller; customers get `NOT_A_MANAGER`
    pub fn restaurant_id(&self) -> Result<&str, AppError> {
        self.restaurant_id
            .as_deref()
            .ok_or_else(|| AppError::new(ErrorCode::NotAManager))
    }
}

/// Create a session token
pub fn create_token(
    user_id: &str,
    restaurant_id: Option<&str>,
    secret: &str,
    ttl_days: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        restaurant_id: restaurant_id.map(str::to_string),
        exp: (now + chrono::Duration::days(ttl_days)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a session token and map failures onto auth error codes
pub fn decode_token(token: &str, secret: &str) -> Result<SessionClaims, AppError> {
    jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired)
            }
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })
}

/// `Set-Cookie` value carrying a fresh session
pub fn session_cookie(token: &str, ttl_days: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        ttl_days * 24 * 60 * 60
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Value of cookie `name` across all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(k, v)| (k, v.trim()))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v)
}

/// Session token from the cookie, falling back to `Authorization: Bearer`
fn session_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, SESSION_COOKIE).or_else(|| {
        headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    })
}

/// Middleware that verifies the session and inserts [`SessionIdentity`]
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers()).ok_or_else(AppError::unauthorized)?;
    let claims = decode_token(token, &state.jwt_secret)?;

    request.extensions_mut().insert(SessionIdentity {
        user_id: claims.sub,
        restaurant_id: claims.restaurant_id,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = create_token("user-1", Some("rest-1"), SECRET, 7).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.restaurant_id.as_deref(), Some("rest-1"));
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_token_without_restaurant() {
        let token = create_token("user-1", None, SECRET, 7).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();
        assert!(claims.restaurant_id.is_none());

        let identity = SessionIdentity {
            user_id: claims.sub,
            restaurant_id: claims.restaurant_id,
        };
        assert_eq!(
            identity.restaurant_id().unwrap_err().code,
            ErrorCode::NotAManager
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token("user-1", None, SECRET, 7).unwrap();
        let err = decode_token(&token, "other-secret").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = SessionClaims {
            sub: "user-1".to_string(),
            restaurant_id: None,
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let err = decode_token(&token, SECRET).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.append(
            http::header::COOKIE,
            HeaderValue::from_static("theme=dark; auth=abc.def.ghi"),
        );
        assert_eq!(cookie_value(&headers, "auth"), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_across_headers_and_empty_values() {
        let mut headers = HeaderMap::new();
        headers.append(http::header::COOKIE, HeaderValue::from_static("auth="));
        assert_eq!(cookie_value(&headers, "auth"), None);

        headers.append(http::header::COOKIE, HeaderValue::from_static("lang=es; auth=tok"));
        assert_eq!(cookie_value(&headers, "auth"), Some("tok"));
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok"),
        );
        assert_eq!(session_token(&headers), Some("tok"));

        headers.insert(http::header::COOKIE, HeaderValue::from_static("auth=cookie-tok"));
        assert_eq!(session_token(&headers), Some("cookie-tok"));
    }

    #[test]
    fn test_cookie_builders() {
        let cookie = session_cookie("tok", 7, false);
        assert!(cookie.starts_with("auth=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        let cleared = clear_session_cookie(true);
        assert!(cleared.starts_with("auth=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.ends_with("; Secure"));
    }
}
