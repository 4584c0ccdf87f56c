//! `POST /functions/v1/send-automated-email`

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::instrument;

use crate::error::AppError;
use crate::services::{DispatchResponse, SendEmailRequest};
use crate::state::AppState;

/// Run the dispatch function for one request.
#[instrument(skip_all)]
pub async fn send_automated_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>, AppError> {
    let Json(request) = payload?;
    let response = state.dispatcher().handle(request).await?;
    Ok(Json(response))
}
