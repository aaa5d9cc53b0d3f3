// Metrics endpoint

use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::metrics::collector::MetricsSnapshot;
use crate::models::user::Role;
use crate::security::gate::Principal;
use axum::{extract::State, response::Json};
use std::sync::Arc;

/// Counters for registrations, logins and submissions, plus store sizes
/// and uptime.
///
/// Requires an ADMIN token.
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<MetricsSnapshot>, ApiError> {
    principal.require_role(Role::Admin)?;

    Ok(Json(state.metrics.get_snapshot(
        &state.users,
        &state.images,
        &state.results,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{create_test_state, signed_in};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_metrics_handler_success() {
        let (state, _dir) = create_test_state();
        signed_in(&state, "root@x.com", Role::Admin).await;

        state.metrics.increment_registrations();
        state.metrics.record_login(true);

        let Json(snapshot) = metrics_handler(
            State(state.clone()),
            Principal {
                email: "root@x.com".to_string(),
                role: Role::Admin,
            },
        )
        .await
        .unwrap();

        assert_eq!(snapshot.registrations, 1);
        assert_eq!(snapshot.successful_logins, 1);
        assert_eq!(snapshot.users, 1);
        assert!(snapshot.uptime_seconds >= 0);
    }

    #[tokio::test]
    async fn test_metrics_handler_requires_admin() {
        let (state, _dir) = create_test_state();

        let result = metrics_handler(
            State(state),
            Principal {
                email: "alice@x.com".to_string(),
                role: Role::User,
            },
        )
        .await;
        assert_eq!(result.unwrap_err().status(), StatusCode::FORBIDDEN);
    }
}
