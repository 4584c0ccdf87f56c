//! HTTP routes for the dispatch service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                               - Liveness
//! GET    /health/ready                         - Readiness (database ping)
//!
//! # CRM API (API key when configured)
//! GET    /api/customers?status=&tag=           - List customers
//! POST   /api/customers                        - Create customer
//! GET    /api/customers/{id}                   - Customer detail
//! PATCH  /api/customers/{id}                   - Update customer
//! DELETE /api/customers/{id}                   - Delete customer
//! GET    /api/customers/{id}/interactions      - Interaction history
//! GET    /api/campaigns                        - List campaigns
//! POST   /api/campaigns                        - Create campaign
//! GET    /api/campaigns/{id}                   - Campaign detail
//! PATCH  /api/campaigns/{id}                   - Update unsent campaign
//! DELETE /api/campaigns/{id}                   - Delete campaign
//! GET    /api/campaigns/{id}/audience          - Audience preview
//! GET    /api/dashboard                        - Dashboard stats
//!
//! # Dispatch function
//! POST   /functions/v1/send-automated-email    - Single or campaign send
//! ```

pub mod campaigns;
pub mod customers;
pub mod dashboard;
pub mod send_email;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderName, Method, StatusCode, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{RequireApiKey, request_id_middleware};
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/customers",
            get(customers::index).post(customers::create),
        )
        .route(
            "/api/customers/{id}",
            get(customers::show)
                .patch(customers::update)
                .delete(customers::destroy),
        )
        .route(
            "/api/customers/{id}/interactions",
            get(customers::interactions),
        )
        .route(
            "/api/campaigns",
            get(campaigns::index).post(campaigns::create),
        )
        .route(
            "/api/campaigns/{id}",
            get(campaigns::show)
                .patch(campaigns::update)
                .delete(campaigns::destroy),
        )
        .route("/api/campaigns/{id}/audience", get(campaigns::audience))
        .route("/api/dashboard", get(dashboard::show))
        .route(
            "/functions/v1/send-automated-email",
            post(send_email::send_automated_email),
        )
        .route_layer(middleware::from_extractor_with_state::<RequireApiKey, _>(
            state.clone(),
        ));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors_layer())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Permissive CORS for browser clients of the function endpoint.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
