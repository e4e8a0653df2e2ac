use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::auth::session::{load_session, session_token};
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

/// The signed-in user, resolved from the session cookie.
/// Handlers taking this argument reject anonymous requests with 401.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::User => Err(AppError::Forbidden),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let session = load_session(&state.redis, &token)
            .await?
            .ok_or(AppError::Unauthorized)?;
        Ok(AuthUser {
            id: session.user_id,
            role: session.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_admin() {
        let admin = AuthUser {
            id: Uuid::nil(),
            role: Role::Admin,
        };
        let user = AuthUser {
            id: Uuid::nil(),
            role: Role::User,
        };
        assert!(admin.require_admin().is_ok());
        assert!(matches!(user.require_admin(), Err(AppError::Forbidden)));
    }
}
