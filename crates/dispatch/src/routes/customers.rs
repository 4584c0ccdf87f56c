//! Customer CRUD and interaction history.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::instrument;

use outreach_core::CustomerId;

use crate::db::{CustomerRepository, InteractionRepository};
use crate::error::{AppError, parse_id};
use crate::models::{Customer, CustomerFilter, CustomerInteraction, CustomerUpdate, NewCustomer};
use crate::state::AppState;

fn customer_not_found() -> AppError {
    AppError::NotFound("Customer not found".to_string())
}

fn ensure_object(metadata: Option<&serde_json::Value>) -> Result<(), AppError> {
    match metadata {
        Some(value) if !value.is_object() => Err(AppError::BadRequest(
            "metadata must be a JSON object".to_string(),
        )),
        _ => Ok(()),
    }
}

/// `GET /api/customers`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    filter: Result<Query<CustomerFilter>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let Query(filter) = filter?;
    let customers = CustomerRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(customers))
}

/// `POST /api/customers`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    let Json(input) = payload?;
    ensure_object(input.metadata.as_ref())?;

    let customer = CustomerRepository::new(state.pool()).create(&input).await?;
    tracing::info!(customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// `GET /api/customers/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, AppError> {
    let id: CustomerId = parse_id(&id, "customer")?;
    CustomerRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(customer_not_found)
}

/// `PATCH /api/customers/{id}`
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerUpdate>, JsonRejection>,
) -> Result<Json<Customer>, AppError> {
    let id: CustomerId = parse_id(&id, "customer")?;
    let Json(update) = payload?;
    ensure_object(update.metadata.as_ref())?;

    CustomerRepository::new(state.pool())
        .update(id, &update)
        .await?
        .map(Json)
        .ok_or_else(customer_not_found)
}

/// `DELETE /api/customers/{id}`
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: CustomerId = parse_id(&id, "customer")?;
    match CustomerRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!(customer_id = %id, "Customer deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(crate::db::RepositoryError::NotFound) => Err(customer_not_found()),
        Err(e) => Err(e.into()),
    }
}

/// `GET /api/customers/{id}/interactions`
#[instrument(skip(state))]
pub async fn interactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CustomerInteraction>>, AppError> {
    let id: CustomerId = parse_id(&id, "customer")?;
    if CustomerRepository::new(state.pool()).get(id).await?.is_none() {
        return Err(customer_not_found());
    }
    let history = InteractionRepository::new(state.pool())
        .list_for_customer(id)
        .await?;
    Ok(Json(history))
}
