//! Access gate: every protected request carries its own bearer token

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;

use crate::core::error::{ApiError, TokenError};
use crate::core::state::AppState;
use crate::models::user::Role;

const BEARER_PREFIX: &str = "Bearer ";

/// Token from `Authorization: Bearer <token>`, if present and well-formed
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Raw bearer token, left for the handler to judge
pub struct BearerToken(pub Option<String>);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_token(&parts.headers).map(str::to_string)))
    }
}

/// Caller identity proven by a valid, unexpired token
#[derive(Debug, Clone)]
pub struct Principal {
    pub email: String,
    pub role: Role,
}

impl Principal {
    /// 403 unless the token's role matches
    pub fn require_role(&self, required: Role) -> Result<(), ApiError> {
        if self.role == required {
            Ok(())
        } else {
            warn!(email = %self.email, role = %self.role, required = %required, "Insufficient role");
            Err(ApiError::Forbidden(format!("{} access only", required)))
        }
    }

    /// 403 unless the caller is an admin or owns `user_id`
    pub fn require_self_or_admin(&self, state: &AppState, user_id: u32) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            return Ok(());
        }
        match state.users.get_by_email(&self.email) {
            Some(user) if user.id == user_id => Ok(()),
            _ => {
                warn!(email = %self.email, user_id, "Access to another user's data denied");
                Err(ApiError::Forbidden("Not the owner".to_string()))
            }
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            warn!(path = %parts.uri.path(), "Request without bearer token");
            ApiError::from(TokenError::Missing)
        })?;

        let claims = state.tokens.authenticate(token).map_err(|e| {
            warn!(path = %parts.uri.path(), error = %e, "Rejected bearer token");
            ApiError::from(e)
        })?;

        let role = claims.role.parse::<Role>().map_err(|e| {
            warn!(path = %parts.uri.path(), error = %e, "Token carries an unknown role");
            ApiError::from(TokenError::Malformed(e))
        })?;

        Ok(Principal {
            email: claims.sub,
            role,
        })
    }
}
