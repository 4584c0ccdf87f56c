//! Integration tests for the CRM JSON API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`outreach migrate`)
//! - The dispatch server running (cargo run -p outreach-dispatch)
//! - `EMAIL_FROM` set and no email provider configured, so sends are logged only
//!
//! Run with: cargo test -p outreach-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the dispatch server (configurable via environment).
fn base_url() -> String {
    std::env::var("DISPATCH_BASE_URL").unwrap_or_else(|_| "http://localhost:3002".to_string())
}

/// Client that sends the API key when one is configured.
fn client() -> Client {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Ok(key) = std::env::var("DISPATCH_API_KEY") {
        headers.insert(
            "apikey",
            key.parse().expect("API key is a valid header value"),
        );
    }
    Client::builder()
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// An email no other test run will collide with.
fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

async fn create_customer(client: &Client, body: &Value) -> Value {
    let resp = client
        .post(format!("{}/api/customers", base_url()))
        .json(body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse JSON")
}

async fn create_campaign(client: &Client, body: &Value) -> Value {
    let resp = client
        .post(format!("{}/api/campaigns", base_url()))
        .json(body)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse JSON")
}

async fn delete(client: &Client, path: &str) {
    let _ = client
        .delete(format!("{}{path}", base_url()))
        .send()
        .await;
}

async fn delete_customer(client: &Client, customer: &Value) {
    let id = customer["id"].as_str().unwrap_or_default();
    delete(client, &format!("/api/customers/{id}")).await;
}

// =============================================================================
// Customers
// =============================================================================

#[tokio::test]
#[ignore = "Requires running dispatch server and database"]
async fn test_customer_lifecycle() {
    let client = client();
    let email = unique_email("lifecycle");

    let created = create_customer(
        &client,
        &json!({"email": email, "first_name": "Ada", "tags": ["vip", " beta ", "vip"]}),
    )
    .await;
    let id = created["id"].as_str().expect("customer id").to_string();
    assert_eq!(created["status"], "active");
    assert_eq!(created["tags"], json!(["vip", "beta"]));
    assert_eq!(created["metadata"], json!({}));

    let resp = client
        .patch(format!("{}/api/customers/{id}", base_url()))
        .json(&json!({"company": "Engines Ltd", "first_name": ""}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(updated["company"], "Engines Ltd");
    assert_eq!(updated["first_name"], Value::Null);

    let resp = client
        .delete(format!("{}/api/customers/{id}", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{}/api/customers/{id}", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running dispatch server and database"]
async fn test_duplicate_customer_email_conflicts() {
    let client = client();
    let email = unique_email("dup");
    let created = create_customer(&client, &json!({"email": email})).await;

    let resp = client
        .post(format!("{}/api/customers", base_url()))
        .json(&json!({"email": email}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    delete_customer(&client, &created).await;
}

#[tokio::test]
#[ignore = "Requires running dispatch server and database"]
async fn test_customer_validation() {
    let client = client();

    let resp = client
        .post(format!("{}/api/customers", base_url()))
        .json(&json!({"email": "not-an-email"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{}/api/customers", base_url()))
        .json(&json!({"email": unique_email("meta"), "metadata": [1, 2]}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .get(format!("{}/api/customers/not-a-uuid", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running dispatch server and database"]
async fn test_list_customers_filters_by_tag() {
    let client = client();
    let tag = format!("t{}", Uuid::new_v4().simple());
    let tagged = create_customer(
        &client,
        &json!({"email": unique_email("tagged"), "tags": [tag]}),
    )
    .await;
    let untagged = create_customer(&client, &json!({"email": unique_email("untagged")})).await;

    let resp = client
        .get(format!("{}/api/customers?tag={tag}", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);
    let listed: Vec<Value> = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], tagged["id"]);

    for customer in [tagged, untagged] {
        delete_customer(&client, &customer).await;
    }
}

// =============================================================================
// Campaigns and dispatch
// =============================================================================

#[tokio::test]
#[ignore = "Requires running dispatch server and database"]
async fn test_campaign_send_round_trip() {
    let client = client();
    let tag = format!("t{}", Uuid::new_v4().simple());
    let member = create_customer(
        &client,
        &json!({"email": unique_email("member"), "first_name": "Grace", "tags": [tag]}),
    )
    .await;
    let outsider = create_customer(&client, &json!({"email": unique_email("outsider")})).await;

    let campaign = create_campaign(
        &client,
        &json!({
            "name": "Round trip",
            "subject": "Hello",
            "content": "Hi {{first_name}}",
            "target_tags": [tag],
            "ai_personalized": true,
        }),
    )
    .await;
    let campaign_id = campaign["id"].as_str().expect("campaign id").to_string();
    assert_eq!(campaign["status"], "draft");

    let resp = client
        .get(format!("{}/api/campaigns/{campaign_id}/audience", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);
    let preview: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(preview["count"], 1);
    assert_eq!(preview["emails"], json!([member["email"]]));

    let resp = client
        .post(format!("{}/functions/v1/send-automated-email", base_url()))
        .json(&json!({"campaignId": campaign_id}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);
    let sent: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(sent["message"], "Sent 1 emails");
    assert_eq!(sent["results"][0]["customer"], member["email"]);

    let resp = client
        .get(format!("{}/api/campaigns/{campaign_id}", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    let stored: Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(stored["status"], "sent");
    assert!(stored["sent_at"].is_string());

    // Sent campaigns are locked.
    let resp = client
        .patch(format!("{}/api/campaigns/{campaign_id}", base_url()))
        .json(&json!({"subject": "Changed"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .get(format!(
            "{}/api/customers/{}/interactions",
            base_url(),
            member["id"].as_str().unwrap_or_default()
        ))
        .send()
        .await
        .expect("Failed to send request");
    let interactions: Vec<Value> = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0]["interaction_type"], "email_sent");
    assert_eq!(interactions[0]["description"], "Campaign: Round trip");

    delete(&client, &format!("/api/campaigns/{campaign_id}")).await;
    for customer in [member, outsider] {
        delete_customer(&client, &customer).await;
    }
}

#[tokio::test]
#[ignore = "Requires running dispatch server and database"]
async fn test_campaign_rejects_manual_sent_status() {
    let client = client();
    let campaign = create_campaign(
        &client,
        &json!({"name": "Manual", "subject": "Hello", "content": "Hi"}),
    )
    .await;
    let id = campaign["id"].as_str().expect("campaign id").to_string();

    let resp = client
        .patch(format!("{}/api/campaigns/{id}", base_url()))
        .json(&json!({"status": "sent"}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    delete(&client, &format!("/api/campaigns/{id}")).await;
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
#[ignore = "Requires running dispatch server and database"]
async fn test_dashboard_stats_shape() {
    let resp = client()
        .get(format!("{}/api/dashboard", base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);

    let stats: Value = resp.json().await.expect("Failed to parse JSON");
    for field in [
        "total_customers",
        "active_customers",
        "total_campaigns",
        "sent_campaigns",
        "recent_interactions",
    ] {
        assert!(stats[field].is_i64(), "{field} should be a count");
    }
    assert!(stats["top_tags"].as_array().is_some_and(|t| t.len() <= 5));
    assert!(stats["recent_activity"].as_array().is_some_and(|a| a.len() <= 10));
}
