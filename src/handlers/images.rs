use crate::core::error::{ApiError, SubmissionError, TokenError};
use crate::core::state::AppState;
use crate::models::api::{SubmitImageRequest, SubmitResponse};
use crate::models::bytes;
use crate::models::image::{ImageLocation, NewImageLocation};
use crate::models::result::AnalysisResult;
use crate::security::gate::{BearerToken, Principal};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::warn;

/// Submit an observation for analysis
///
/// POST /image/save
///
/// The owner is always the token's subject; any user reference in the body
/// is ignored.
pub async fn save_image_handler(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Json(request): Json<SubmitImageRequest>,
) -> Result<Response, ApiError> {
    if token.is_none() {
        warn!("Image submission without bearer token");
        return Err(TokenError::Missing.into());
    }

    let image = bytes::decode(&request.image)
        .map_err(|e| ApiError::InvalidParameter(format!("image is not valid base64: {}", e)))?;

    let location = NewImageLocation {
        latitude: request.latitude,
        longitude: request.longitude,
        image,
    };
    location.validate().map_err(ApiError::InvalidParameter)?;

    state.metrics.increment_submissions();

    let outcome = state
        .workflow
        .submit(token.as_deref(), location)
        .await
        .map_err(|e| {
            if matches!(e, SubmissionError::Upstream(_)) {
                state.metrics.increment_upstream_failures();
            }
            ApiError::from(e)
        })?;

    state.metrics.record_outcome(outcome.change);

    Ok((
        StatusCode::OK,
        Json(SubmitResponse {
            message: "Image and result saved successfully".to_string(),
            result: outcome.result,
        }),
    )
        .into_response())
}

/// GET /image/user/{id} (admin or owner)
pub async fn list_images_handler(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<u32>,
) -> Result<Json<Vec<ImageLocation>>, ApiError> {
    principal.require_self_or_admin(&state, id)?;
    Ok(Json(state.images.list_by_user(id)))
}

/// GET /results/user/{id} (admin or owner)
pub async fn list_results_handler(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(id): Path<u32>,
) -> Result<Json<Vec<AnalysisResult>>, ApiError> {
    principal.require_self_or_admin(&state, id)?;
    Ok(Json(state.results.list_by_user(id)))
}
