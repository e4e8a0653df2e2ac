use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::lockout::{locked_until, record_failure};
use crate::auth::password::{hash_password, validate_password, verify_password};
use crate::auth::session::{
    clear_session_cookie, create_session, delete_session, session_cookie, session_token,
    SessionData,
};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{Role, UserProfile, UserRow};
use crate::sanitize::fields::sanitize_required;
use crate::sanitize::FieldRule;
use crate::state::AppState;

const EMAIL: FieldRule = FieldRule::email("email");
const FULL_NAME: FieldRule = FieldRule::strict("full_name", 100);
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    Ok(sanitize_required(email, &EMAIL)?.to_lowercase())
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let email = normalize_email(&req.email)?;
    let full_name = sanitize_required(&req.full_name, &FULL_NAME)?;
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password)?;
    let verification_token = Uuid::new_v4().simple().to_string();

    let inserted = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, email, full_name, password_hash, role, verification_token)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&full_name)
    .bind(&password_hash)
    .bind(Role::User.as_str())
    .bind(&verification_token)
    .fetch_one(&state.db)
    .await;

    let user = match inserted {
        Ok(user) => user,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    info!("Registered user {}", user.id);
    // Mail delivery lives outside this service; the token is picked up from here.
    debug!("Verification link for {}: /api/auth/verify/{verification_token}", user.id);

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = normalize_email(&req.email)
        .map_err(|_| AppError::Validation(INVALID_CREDENTIALS.to_string()))?;

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    // Same response for unknown emails and wrong passwords.
    let user = user.ok_or(AppError::Unauthorized)?;

    let now = Utc::now();
    if let Some(until) = locked_until(&user, now) {
        return Err(AppError::Locked(format!(
            "Too many failed attempts, try again after {}",
            until.to_rfc3339()
        )));
    }

    if !verify_password(&req.password, &user.password_hash) {
        let failure = record_failure(&user, now);
        sqlx::query(
            "UPDATE users SET failed_login_attempts = $1, locked_until = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(failure.attempts)
        .bind(failure.locked_until)
        .bind(user.id)
        .execute(&state.db)
        .await?;

        if let Some(until) = failure.locked_until {
            warn!("Locked user {} after {} failed logins", user.id, failure.attempts);
            return Err(AppError::Locked(format!(
                "Too many failed attempts, try again after {}",
                until.to_rfc3339()
            )));
        }
        return Err(AppError::Unauthorized);
    }

    if user.failed_login_attempts != 0 || user.locked_until.is_some() {
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(user.id)
        .execute(&state.db)
        .await?;
    }

    let ttl = state.config.session_ttl_secs;
    let token = create_session(
        &state.redis,
        SessionData {
            user_id: user.id,
            role: user.role(),
        },
        ttl,
    )
    .await?;
    info!("User {} logged in", user.id);

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&token, ttl, state.config.cookie_secure),
        )],
        Json(UserProfile::from(&user)),
    ))
}

/// POST /api/auth/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token(&headers) {
        delete_session(&state.redis, &token).await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.cookie_secure),
        )],
    ))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;
    let row = row.ok_or(AppError::Unauthorized)?;
    Ok(Json(UserProfile::from(&row)))
}

/// GET /api/auth/verify/:token
pub async fn handle_verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"
        UPDATE users
        SET email_verified = TRUE, verification_token = NULL, updated_at = NOW()
        WHERE verification_token = $1
        RETURNING *
        "#,
    )
    .bind(token.trim())
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound("Invalid verification token".to_string()))?;
    info!("Verified email for user {}", row.id);
    Ok(Json(UserProfile::from(&row)))
}
