use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{SuccessResponse, UpdateUserRequest};
use crate::models::user::{Role, UserView};
use crate::security::gate::Principal;
use crate::stores::user_store::UserChanges;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::info;

/// GET /users (admin)
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<Vec<UserView>>, ApiError> {
    principal.require_role(Role::Admin)?;

    let users = state.users.list().iter().map(|user| user.view()).collect();
    Ok(Json(users))
}

/// GET /users/{id} (admin or the user themself)
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<u32>,
) -> Result<Json<UserView>, ApiError> {
    principal.require_self_or_admin(&state, id)?;

    state
        .users
        .get_by_id(id)
        .map(|user| Json(user.view()))
        .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))
}

/// PUT /users/{id} (admin)
///
/// Reputation counters can be raised but never lowered.
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<u32>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserView>, ApiError> {
    principal.require_role(Role::Admin)?;

    let changes = UserChanges {
        email: request.email,
        password: request.password,
        merit: request.merit,
        foul_count: request.foul_count,
    };
    let user = state.users.update(id, changes).await?;

    info!(user_id = id, admin = %principal.email, "User updated");
    Ok(Json(user.view()))
}

/// DELETE /users/{id} (admin)
///
/// Removes the user together with every image location and result they own.
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<u32>,
) -> Result<Response, ApiError> {
    principal.require_role(Role::Admin)?;

    let user = state.users.delete(id)?;
    let images = state.images.purge_user(id);
    let results = state.results.purge_user(id);

    info!(
        user_id = id,
        email = %user.email,
        images,
        results,
        admin = %principal.email,
        "User deleted"
    );

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: format!("User {} deleted", id),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{create_test_state, signed_in};
    use crate::models::image::NewImageLocation;
    use crate::services::analyzer::Analysis;

    fn principal(email: &str, role: Role) -> Principal {
        Principal {
            email: email.to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_list_users_requires_admin() {
        let (state, _dir) = create_test_state();
        signed_in(&state, "alice@x.com", Role::User).await;
        signed_in(&state, "root@x.com", Role::Admin).await;

        let denied = list_users_handler(
            State(state.clone()),
            principal("alice@x.com", Role::User),
        )
        .await;
        assert_eq!(denied.unwrap_err().status(), StatusCode::FORBIDDEN);

        let Json(users) = list_users_handler(
            State(state.clone()),
            principal("root@x.com", Role::Admin),
        )
        .await
        .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].email, "alice@x.com");
    }

    #[tokio::test]
    async fn test_get_user_self_or_admin() {
        let (state, _dir) = create_test_state();
        let (alice, _) = signed_in(&state, "alice@x.com", Role::User).await;
        let (bob, _) = signed_in(&state, "bob@x.com", Role::User).await;

        let Json(view) = get_user_handler(
            State(state.clone()),
            principal("alice@x.com", Role::User),
            Path(alice.id),
        )
        .await
        .unwrap();
        assert_eq!(view.id, alice.id);

        let denied = get_user_handler(
            State(state.clone()),
            principal("alice@x.com", Role::User),
            Path(bob.id),
        )
        .await;
        assert_eq!(denied.unwrap_err().status(), StatusCode::FORBIDDEN);

        let missing = get_user_handler(
            State(state.clone()),
            principal("root@x.com", Role::Admin),
            Path(999),
        )
        .await;
        assert_eq!(missing.unwrap_err().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_user_changes_credentials() {
        let (state, _dir) = create_test_state();
        let (alice, _) = signed_in(&state, "alice@x.com", Role::User).await;

        let Json(view) = update_user_handler(
            State(state.clone()),
            principal("root@x.com", Role::Admin),
            Path(alice.id),
            Json(UpdateUserRequest {
                email: Some("alice@y.com".to_string()),
                password: Some("pw2".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(view.email, "alice@y.com");
        assert!(state.users.authenticate("alice@y.com", "pw2").await.unwrap());
        assert!(state.users.get_by_email("alice@x.com").is_none());
    }

    #[tokio::test]
    async fn test_update_user_cannot_lower_reputation() {
        let (state, _dir) = create_test_state();
        let (alice, _) = signed_in(&state, "alice@x.com", Role::User).await;
        let admin = principal("root@x.com", Role::Admin);

        let Json(view) = update_user_handler(
            State(state.clone()),
            admin.clone(),
            Path(alice.id),
            Json(UpdateUserRequest {
                merit: Some(10),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.merit, 10);

        let lowered = update_user_handler(
            State(state.clone()),
            admin,
            Path(alice.id),
            Json(UpdateUserRequest {
                merit: Some(4),
                ..Default::default()
            }),
        )
        .await;
        assert_eq!(lowered.unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.users.get_by_id(alice.id).unwrap().merit, 10);
    }

    #[tokio::test]
    async fn test_update_user_rejects_non_admin() {
        let (state, _dir) = create_test_state();
        let (alice, _) = signed_in(&state, "alice@x.com", Role::User).await;

        let denied = update_user_handler(
            State(state.clone()),
            principal("alice@x.com", Role::User),
            Path(alice.id),
            Json(UpdateUserRequest::default()),
        )
        .await;
        assert_eq!(denied.unwrap_err().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let (state, _dir) = create_test_state();
        let (alice, _) = signed_in(&state, "alice@x.com", Role::User).await;
        let (bob, _) = signed_in(&state, "bob@x.com", Role::User).await;

        for owner in [alice.id, bob.id] {
            state
                .images
                .insert(
                    owner,
                    NewImageLocation {
                        latitude: 1.0,
                        longitude: 2.0,
                        image: vec![1],
                    },
                )
                .unwrap();
            state
                .results
                .insert(
                    owner,
                    &Analysis {
                        vegetation_loss_percent: 7.0,
                        poisoning_detected: false,
                    },
                )
                .unwrap();
        }

        let response = delete_user_handler(
            State(state.clone()),
            principal("root@x.com", Role::Admin),
            Path(alice.id),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert!(state.users.get_by_id(alice.id).is_none());
        assert!(state.images.list_by_user(alice.id).is_empty());
        assert!(state.results.list_by_user(alice.id).is_empty());
        assert_eq!(state.images.list_by_user(bob.id).len(), 1);
        assert_eq!(state.results.list_by_user(bob.id).len(), 1);

        let again = delete_user_handler(
            State(state.clone()),
            principal("root@x.com", Role::Admin),
            Path(alice.id),
        )
        .await;
        assert_eq!(again.unwrap_err().status(), StatusCode::NOT_FOUND);
    }
}
