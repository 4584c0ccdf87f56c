//! Campaign CRUD and audience preview.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use outreach_core::{CampaignId, CampaignStatus};

use crate::db::{CampaignPatch, CampaignRepository, CustomerRepository, RepositoryError};
use crate::error::{AppError, parse_id};
use crate::models::{CampaignUpdate, EmailCampaign, NewCampaign};
use crate::state::AppState;

fn campaign_not_found() -> AppError {
    AppError::NotFound("Campaign not found".to_string())
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn validate_update(update: &CampaignUpdate) -> Result<(), AppError> {
    if update.status == Some(CampaignStatus::Sent) {
        return Err(AppError::BadRequest(
            "status cannot be set to sent; dispatch the campaign instead".to_string(),
        ));
    }
    for (field, value) in [
        ("name", &update.name),
        ("subject", &update.subject),
        ("content", &update.content),
    ] {
        if let Some(value) = value {
            require_text(field, value)?;
        }
    }
    Ok(())
}

/// Resolved audience for a campaign.
#[derive(Debug, Serialize)]
pub struct AudiencePreview {
    pub campaign_id: CampaignId,
    pub target_tags: Vec<String>,
    pub count: usize,
    pub emails: Vec<String>,
}

/// `GET /api/campaigns`
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<EmailCampaign>>, AppError> {
    let campaigns = CampaignRepository::new(state.pool()).list().await?;
    Ok(Json(campaigns))
}

/// `POST /api/campaigns`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewCampaign>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailCampaign>), AppError> {
    let Json(input) = payload?;
    require_text("name", &input.name)?;
    require_text("subject", &input.subject)?;
    require_text("content", &input.content)?;

    let campaign = CampaignRepository::new(state.pool()).create(&input).await?;
    tracing::info!(campaign_id = %campaign.id, status = %campaign.status, "Campaign created");
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// `GET /api/campaigns/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmailCampaign>, AppError> {
    let id: CampaignId = parse_id(&id, "campaign")?;
    CampaignRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(campaign_not_found)
}

/// `PATCH /api/campaigns/{id}`
///
/// Sent campaigns are frozen (409), and `sent` is only reachable through
/// dispatch (400).
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CampaignUpdate>, JsonRejection>,
) -> Result<Json<EmailCampaign>, AppError> {
    let id: CampaignId = parse_id(&id, "campaign")?;
    let Json(update) = payload?;
    validate_update(&update)?;

    match CampaignRepository::new(state.pool()).update(id, &update).await? {
        CampaignPatch::Updated(campaign) => Ok(Json(campaign)),
        CampaignPatch::Locked => Err(AppError::Conflict(
            "Campaign has already been sent".to_string(),
        )),
        CampaignPatch::Missing => Err(campaign_not_found()),
    }
}

/// `DELETE /api/campaigns/{id}`
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CampaignId = parse_id(&id, "campaign")?;
    match CampaignRepository::new(state.pool()).delete(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RepositoryError::NotFound) => Err(campaign_not_found()),
        Err(e) => Err(e.into()),
    }
}

/// `GET /api/campaigns/{id}/audience`
#[instrument(skip(state))]
pub async fn audience(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AudiencePreview>, AppError> {
    let id: CampaignId = parse_id(&id, "campaign")?;
    let campaign = CampaignRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(campaign_not_found)?;

    let customers = CustomerRepository::new(state.pool())
        .audience(&campaign.target_tags)
        .await?;

    Ok(Json(AudiencePreview {
        campaign_id: campaign.id,
        count: customers.len(),
        emails: customers.into_iter().map(|c| c.email.into_inner()).collect(),
        target_tags: campaign.target_tags,
    }))
}
