//! Upload endpoint

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use drivedrop_core::AppError;
use drivedrop_storage::cancel::with_deadline;

use crate::error::HttpAppError;
use crate::services::upload::UploadService;
use crate::state::AppState;
use crate::utils::multipart::read_upload_form;

/// `POST /api/upload`: store the form's files and a metadata document in the drive.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_upload_form(multipart?).await?;

    // Child of the shutdown token: shutdown aborts in-flight drive calls.
    let cancel = state.shutdown.child_token();
    let deadline = state.uploader.upload_deadline();

    let service = UploadService::new(&state.uploader);
    let response =
        with_deadline(deadline, &cancel, service.process(form, Utc::now(), &cancel)).await?;

    Ok(Json(response))
}

/// Any other method on the upload route.
pub async fn method_not_allowed() -> HttpAppError {
    HttpAppError(AppError::MethodNotAllowed("Use POST".to_string()))
}
