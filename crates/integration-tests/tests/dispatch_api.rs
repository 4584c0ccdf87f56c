//! The `send-automated-email` function driven through the full router.
//!
//! Uses the in-memory store and scripted mailer, so no database or email
//! provider is needed.

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use outreach_core::{CampaignStatus, CustomerStatus};
use outreach_dispatch::testing::{MemoryStore, ScriptedMailer, campaign, customer};
use outreach_integration_tests::{TEST_API_KEY, TestApp};

// =============================================================================
// Single mode
// =============================================================================

#[tokio::test]
async fn test_single_send_returns_email_result_and_logs_interaction() {
    let ada = customer("ada@example.com", Some("Ada"), &["vip"]);
    let app = TestApp::new(MemoryStore::new().with_customer(ada.clone()), ScriptedMailer::new());

    let (status, body) = app
        .send_email(&json!({
            "customerId": ada.id.to_string(),
            "subject": "Welcome",
            "content": "Hi {{first_name}} ({{email}})",
            "useAI": true,
        }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Email sent");
    assert_eq!(body["emailResult"]["success"], true);

    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Welcome");
    assert_eq!(sent[0].html, "Hi Ada (ada@example.com)");

    let logged = app.store.interactions();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].customer_id, ada.id);
    assert_eq!(logged[0].description, "Sent email: Welcome");
}

#[tokio::test]
async fn test_single_send_unknown_customer_is_404_without_side_effects() {
    let app = TestApp::new(MemoryStore::new(), ScriptedMailer::new());

    let (status, body) = app
        .send_email(&json!({
            "customerId": Uuid::new_v4().to_string(),
            "subject": "Welcome",
            "content": "Hi",
        }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Customer not found"}));
    assert!(app.mailer.sent().is_empty());
    assert!(app.store.interactions().is_empty());
}

#[tokio::test]
async fn test_single_send_provider_failure_is_500() {
    let ada = customer("ada@example.com", None, &[]);
    let app = TestApp::new(
        MemoryStore::new().with_customer(ada.clone()),
        ScriptedMailer::new().failing_for("ada@example.com"),
    );

    let (status, body) = app
        .send_email(&json!({
            "customerId": ada.id.to_string(),
            "subject": "Welcome",
            "content": "Hi",
        }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Email delivery failed"}));
    assert!(app.store.interactions().is_empty());
}

// =============================================================================
// Campaign mode
// =============================================================================

#[tokio::test]
async fn test_campaign_reaches_active_customers_sharing_a_tag() {
    let vip = customer("vip@example.com", Some("Vera"), &["vip"]);
    let beta = customer("beta@example.com", Some("Ben"), &["beta", "newsletter"]);
    let other = customer("other@example.com", None, &["newsletter"]);
    let mut lapsed = customer("lapsed@example.com", None, &["vip"]);
    lapsed.status = CustomerStatus::Inactive;
    let promo = campaign("Preview", "Hi {{first_name}}", &["vip", "beta"], true);

    let app = TestApp::new(
        MemoryStore::new()
            .with_customer(vip)
            .with_customer(beta)
            .with_customer(other)
            .with_customer(lapsed)
            .with_campaign(promo.clone()),
        ScriptedMailer::new(),
    );

    let (status, body) = app
        .send_email(&json!({"campaignId": promo.id.to_string()}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "message": "Sent 2 emails",
            "results": [
                {"customer": "vip@example.com", "status": "sent"},
                {"customer": "beta@example.com", "status": "sent"},
            ],
        })
    );

    let bodies: Vec<String> = app.mailer.sent().into_iter().map(|e| e.html).collect();
    assert_eq!(bodies, vec!["Hi Vera".to_string(), "Hi Ben".to_string()]);

    let stored = app.store.stored_campaign(promo.id).expect("campaign exists");
    assert_eq!(stored.status, CampaignStatus::Sent);
    assert!(stored.sent_at.is_some());
    assert_eq!(app.store.sent_marks(), vec![promo.id]);
}

#[tokio::test]
async fn test_campaign_without_target_tags_reaches_every_active_customer() {
    let mut lapsed = customer("lapsed@example.com", None, &[]);
    lapsed.status = CustomerStatus::Inactive;
    let everyone = campaign("Newsletter", "Hello {{first_name}}", &[], false);

    let app = TestApp::new(
        MemoryStore::new()
            .with_customer(customer("a@example.com", None, &["vip"]))
            .with_customer(customer("b@example.com", None, &[]))
            .with_customer(lapsed)
            .with_campaign(everyone.clone()),
        ScriptedMailer::new(),
    );

    let (status, body) = app
        .send_email(&json!({"campaignId": everyone.id.to_string()}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sent 2 emails");
    // Not personalized: placeholders go out verbatim.
    assert!(app.mailer.sent().iter().all(|e| e.html == "Hello {{first_name}}"));
    assert_eq!(app.store.interactions().len(), 2);
}

#[tokio::test]
async fn test_campaign_is_marked_sent_once_even_when_deliveries_fail() {
    let promo = campaign("Preview", "Hi", &[], false);
    let app = TestApp::new(
        MemoryStore::new()
            .with_customer(customer("ok@example.com", None, &[]))
            .with_customer(customer("bounce@example.com", None, &[]))
            .with_campaign(promo.clone()),
        ScriptedMailer::new().failing_for("bounce@example.com"),
    );

    let (status, body) = app
        .send_email(&json!({"campaignId": promo.id.to_string()}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["results"],
        json!([
            {"customer": "ok@example.com", "status": "sent"},
            {"customer": "bounce@example.com", "status": "failed"},
        ])
    );
    // Failed attempts are logged too.
    assert_eq!(app.store.interactions().len(), 2);
    assert_eq!(app.store.sent_marks(), vec![promo.id]);
}

#[tokio::test]
async fn test_unknown_campaign_is_404_without_side_effects() {
    let app = TestApp::new(
        MemoryStore::new().with_customer(customer("a@example.com", None, &[])),
        ScriptedMailer::new(),
    );

    let (status, body) = app
        .send_email(&json!({"campaignId": Uuid::new_v4().to_string()}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Campaign not found"}));
    assert!(app.mailer.sent().is_empty());
    assert!(app.store.interactions().is_empty());
    assert!(app.store.sent_marks().is_empty());
}

#[tokio::test]
async fn test_campaign_with_empty_audience_is_404() {
    let promo = campaign("Ghosts", "Boo", &["ghost"], false);
    let app = TestApp::new(
        MemoryStore::new()
            .with_customer(customer("a@example.com", None, &["vip"]))
            .with_campaign(promo.clone()),
        ScriptedMailer::new(),
    );

    let (status, body) = app
        .send_email(&json!({"campaignId": promo.id.to_string()}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No customers found for campaign"}));
    assert!(app.store.sent_marks().is_empty());
}

// =============================================================================
// Request validation
// =============================================================================

#[tokio::test]
async fn test_incomplete_request_is_400() {
    let app = TestApp::new(MemoryStore::new(), ScriptedMailer::new());

    let (status, body) = app
        .send_email(&json!({"customerId": Uuid::new_v4().to_string(), "subject": "Hi"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Invalid request. Provide campaignId or (customerId + subject + content)"})
    );
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = TestApp::new(MemoryStore::new(), ScriptedMailer::new());

    let (status, body) = app
        .request(
            Method::POST,
            "/functions/v1/send-automated-email",
            &[],
            Some("{not json"),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_garbage_campaign_id_is_400() {
    let app = TestApp::new(MemoryStore::new(), ScriptedMailer::new());

    let (status, body) = app.send_email(&json!({"campaignId": "spring-sale"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid campaignId"}));
}

// =============================================================================
// Ambient behavior
// =============================================================================

#[tokio::test]
async fn test_api_key_is_enforced_when_configured() {
    let app = TestApp::with_api_key(MemoryStore::new(), ScriptedMailer::new());
    let body = json!({"campaignId": Uuid::new_v4().to_string()}).to_string();
    let uri = "/functions/v1/send-automated-email";

    let (status, json) = app.request(Method::POST, uri, &[], Some(&body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, serde_json::json!({"error": "Missing API key"}));

    let (status, _) = app
        .request(
            Method::POST,
            uri,
            &[("authorization", "Bearer not-the-key")],
            Some(&body),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bearer = format!("Bearer {TEST_API_KEY}");
    let (status, _) = app
        .request(Method::POST, uri, &[("authorization", &bearer)], Some(&body))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::POST, uri, &[("apikey", TEST_API_KEY)], Some(&body))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Health stays open.
    let (status, _) = app.request(Method::GET, "/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_is_answered() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = TestApp::with_api_key(MemoryStore::new(), ScriptedMailer::new());
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/functions/v1/send-automated-email")
                .header("origin", "https://crm.example.com")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type, apikey")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .expect("cors header"),
        "*"
    );
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = TestApp::new(MemoryStore::new(), ScriptedMailer::new());
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "trace-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(
        response.headers().get("x-request-id").expect("request id"),
        "trace-abc"
    );
}
