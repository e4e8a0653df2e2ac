use axum::http::{header, HeaderMap};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::Role;

pub const SESSION_COOKIE: &str = "session";
const SESSION_TOKEN_BYTES: usize = 32;

/// What a session token resolves to in Redis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn new_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// Stores a new session and returns its token.
pub async fn create_session(
    redis: &redis::Client,
    data: SessionData,
    ttl_secs: u64,
) -> Result<String, AppError> {
    let token = new_session_token();
    let value = serde_json::to_string(&data).map_err(anyhow::Error::from)?;

    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("SET")
        .arg(session_key(&token))
        .arg(value)
        .arg("EX")
        .arg(ttl_secs)
        .query_async::<_, ()>(&mut conn)
        .await?;
    Ok(token)
}

/// Unknown, expired and corrupt sessions all resolve to `None`.
pub async fn load_session(
    redis: &redis::Client,
    token: &str,
) -> Result<Option<SessionData>, AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    let raw: Option<String> = redis::cmd("GET")
        .arg(session_key(token))
        .query_async(&mut conn)
        .await?;
    Ok(raw.and_then(|json| serde_json::from_str(&json).ok()))
}

pub async fn delete_session(redis: &redis::Client, token: &str) -> Result<(), AppError> {
    let mut conn = redis.get_multiplexed_async_connection().await?;
    redis::cmd("DEL")
        .arg(session_key(token))
        .query_async::<_, ()>(&mut conn)
        .await?;
    Ok(())
}

/// `Set-Cookie` value for a fresh session.
pub fn session_cookie(token: &str, ttl_secs: u64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={ttl_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie in the browser.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// Reads the session token from the `Cookie` request header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_tokens_are_random_hex() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), SESSION_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 3600, false);
        assert_eq!(
            cookie,
            "session=abc; HttpOnly; Path=/; SameSite=Lax; Max-Age=3600"
        );
        assert!(session_cookie("abc", 3600, true).ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=deadbeef; lang=en"),
        );
        assert_eq!(session_token(&headers), Some("deadbeef".to_string()));
    }

    #[test]
    fn test_missing_or_empty_session_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_session_data_json_shape() {
        let data = SessionData {
            user_id: Uuid::nil(),
            role: Role::Admin,
        };
        let json = serde_json::to_value(data).unwrap();
        assert_eq!(json["role"], "admin");
    }
}
