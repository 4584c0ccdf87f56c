//! Dashboard summary.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::error::AppError;
use crate::models::DashboardStats;
use crate::state::AppState;

/// `GET /api/dashboard`
#[instrument(skip_all)]
pub async fn show(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    let stats = DashboardRepository::new(state.pool()).stats(Utc::now()).await?;
    Ok(Json(stats))
}
