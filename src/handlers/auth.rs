use crate::core::error::{ApiError, StoreError};
use crate::core::state::AppState;
use crate::models::api::{AuthResponse, LoginRequest, RegisterRequest};
use crate::models::user::Role;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Register a new account and hand back a session token
///
/// POST /register {email, password, role?}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::InvalidParameter(
            "email and password are required".to_string(),
        ));
    }

    let role = match request.role.as_deref().map(str::trim) {
        None | Some("") => Role::User,
        Some(name) => name.parse::<Role>().map_err(ApiError::InvalidParameter)?,
    };

    let user = state
        .users
        .create(email, &request.password, role)
        .await
        .map_err(|e| {
            if matches!(e, StoreError::EmailTaken(_)) {
                warn!(email = %email, "Registration with an existing email");
            }
            ApiError::from(e)
        })?;

    let token = state.tokens.issue(&user.email, user.role)?;
    state.metrics.increment_registrations();

    info!(user_id = user.id, email = %user.email, role = %user.role, "User registered");

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user_id: user.id,
            email: user.email,
            role: user.role,
            expiration: Some(state.tokens.ttl_ms()),
        }),
    )
        .into_response())
}

/// Exchange credentials for a session token
///
/// POST /login {email, password}
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let authenticated = state
        .users
        .authenticate(&request.email, &request.password)
        .await?;

    // The user may have been deleted between the two lookups
    let user = match authenticated.then(|| state.users.get_by_email(&request.email)).flatten() {
        Some(user) => user,
        None => {
            state.metrics.record_login(false);
            warn!(email = %request.email, "Failed login attempt");
            return Err(ApiError::Unauthorized("Invalid email or password".to_string()));
        }
    };

    let token = state.tokens.issue(&user.email, user.role)?;
    state.metrics.record_login(true);

    info!(user_id = user.id, email = %user.email, "User logged in");

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            token,
            user_id: user.id,
            email: user.email,
            role: user.role,
            expiration: None,
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::create_test_state;

    fn register_request(email: &str, password: &str, role: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: role.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_defaults_to_user_role() {
        let (state, _dir) = create_test_state();

        let response = register_handler(
            State(state.clone()),
            Json(register_request("alice@x.com", "pw1", None)),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = state.users.get_by_email("alice@x.com").unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(state.metrics.registrations.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_register_accepts_role_in_any_case() {
        let (state, _dir) = create_test_state();

        register_handler(
            State(state.clone()),
            Json(register_request("root@x.com", "pw", Some("admin"))),
        )
        .await
        .unwrap();

        assert_eq!(state.users.get_by_email("root@x.com").unwrap().role, Role::Admin);
    }

    #[tokio::test]
    async fn test_register_duplicate_is_bad_request() {
        let (state, _dir) = create_test_state();
        register_handler(State(state.clone()), Json(register_request("alice@x.com", "pw1", None)))
            .await
            .unwrap();

        let result = register_handler(
            State(state.clone()),
            Json(register_request("alice@x.com", "pw2", None)),
        )
        .await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_role_and_blank_fields() {
        let (state, _dir) = create_test_state();

        let bad_role = register_handler(
            State(state.clone()),
            Json(register_request("alice@x.com", "pw1", Some("superuser"))),
        )
        .await;
        assert_eq!(bad_role.unwrap_err().status(), StatusCode::BAD_REQUEST);

        let blank = register_handler(State(state.clone()), Json(register_request(" ", "pw1", None))).await;
        assert_eq!(blank.unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert!(state.users.is_empty());
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let (state, _dir) = create_test_state();
        state.users.create("alice@x.com", "pw1", Role::User).await.unwrap();

        let ok = login_handler(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@x.com".to_string(),
                password: "pw1".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let wrong = login_handler(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@x.com".to_string(),
                password: "nope".to_string(),
            }),
        )
        .await;
        assert_eq!(wrong.unwrap_err().status(), StatusCode::UNAUTHORIZED);

        let unknown = login_handler(
            State(state.clone()),
            Json(LoginRequest {
                email: "ghost@x.com".to_string(),
                password: "pw1".to_string(),
            }),
        )
        .await;
        assert_eq!(unknown.unwrap_err().status(), StatusCode::UNAUTHORIZED);
    }
}
