use crate::core::error::ApiError;
use axum::{
    http::{Method, Uri},
    response::{IntoResponse, Response},
};

pub async fn fallback_handler(method: Method, uri: Uri) -> Response {
    ApiError::NotFound(format!("No route for {} {}", method, uri.path())).into_response()
}
