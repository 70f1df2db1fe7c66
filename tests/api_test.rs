//! Integration tests for the HTTP command surface: registration, login,
//! worker discovery, and the work-request lifecycle.

use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Start the server on a random port and return its base URL.
async fn start_test_server() -> (String, SocketAddr) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = worklink_server::db::init_db(&data_dir).expect("Failed to init DB");
    let state = worklink_server::state::AppState {
        db,
        registry: Arc::new(worklink_server::presence::PresenceRegistry::new()),
    };

    let app = worklink_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    let base_url = format!("http://{}", addr);
    (base_url, addr)
}

/// Register an account and return its user id.
async fn register_account(
    base_url: &str,
    name: &str,
    email: &str,
    role: &str,
    skills: &[&str],
) -> String {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/register", base_url))
        .json(&json!({
            "name": name,
            "email": email,
            "password": "hunter2",
            "role": role,
            "phone": "555-0100",
            "address": "12 Canal St",
            "skills": skills,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 201, "Registration failed for {}", email);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["userId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_and_login() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let user_id = register_account(&base_url, "Ana", "ana@example.com", "user", &[]).await;

    let resp = client
        .post(format!("{}/api/login", base_url))
        .json(&json!({ "email": "ana@example.com", "password": "hunter2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["userId"], user_id.as_str());
    assert_eq!(body["role"], "user");
    assert_eq!(body["name"], "Ana");

    // Wrong password is rejected
    let resp = client
        .post(format!("{}/api/login", base_url))
        .json(&json!({ "email": "ana@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    register_account(&base_url, "Ana", "ana@example.com", "user", &[]).await;

    let resp = client
        .post(format!("{}/api/register", base_url))
        .json(&json!({
            "name": "Other Ana",
            "email": "ana@example.com",
            "password": "different",
            "role": "user",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_workers_listing_is_public_profile_only() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    register_account(&base_url, "Ana", "ana@example.com", "user", &[]).await;
    register_account(
        &base_url,
        "Bo",
        "bo@example.com",
        "worker",
        &["plumbing", "tiling"],
    )
    .await;
    register_account(&base_url, "Cy", "cy@example.com", "worker", &["wiring"]).await;

    let resp = client
        .get(format!("{}/api/workers", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let workers: serde_json::Value = resp.json().await.unwrap();
    let workers = workers.as_array().unwrap();

    // Only worker accounts are listed
    assert_eq!(workers.len(), 2);
    for worker in workers {
        assert_eq!(worker["role"], "worker");
        assert!(worker.get("password").is_none(), "password must never leak");
    }
    assert_eq!(workers[0]["skills"], json!(["plumbing", "tiling"]));
}

#[tokio::test]
async fn test_get_user_profile() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let user_id = register_account(&base_url, "Ana", "ana@example.com", "user", &[]).await;

    let resp = client
        .get(format!("{}/api/user/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "Ana");
    assert_eq!(body["phone"], "555-0100");
    assert!(body.get("password").is_none());

    // Unknown id -> 404
    let resp = client
        .get(format!("{}/api/user/no-such-user", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_request_lifecycle() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let user_id = register_account(&base_url, "Ana", "ana@example.com", "user", &[]).await;
    let worker_id =
        register_account(&base_url, "Bo", "bo@example.com", "worker", &["plumbing"]).await;

    // Create: lands pending, enriched with the requester's profile
    let resp = client
        .post(format!("{}/api/requests", base_url))
        .json(&json!({
            "userId": user_id,
            "workerId": worker_id,
            "description": "Leaking sink",
            "location": "Kitchen",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    let request_id = body["request"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["request"]["status"], "pending");
    assert_eq!(body["request"]["user"]["name"], "Ana");
    assert!(body["request"]["user"].get("password").is_none());

    // Worker-side listing embeds the requester
    let resp = client
        .get(format!("{}/api/requests/worker/{}", base_url, worker_id))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["user"]["email"], "ana@example.com");

    // Accept: response carries the worker's profile
    let resp = client
        .patch(format!("{}/api/requests/{}", base_url, request_id))
        .json(&json!({ "status": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["request"]["status"], "accepted");
    assert_eq!(body["request"]["worker"]["name"], "Bo");

    // User-side listing embeds the worker
    let resp = client
        .get(format!("{}/api/requests/user/{}", base_url, user_id))
        .send()
        .await
        .unwrap();
    let listing: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(listing[0]["status"], "accepted");
    assert_eq!(listing[0]["worker"]["skills"], json!(["plumbing"]));
}

#[tokio::test]
async fn test_request_validation() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let user_id = register_account(&base_url, "Ana", "ana@example.com", "user", &[]).await;
    let worker_id = register_account(&base_url, "Bo", "bo@example.com", "worker", &[]).await;

    // Unknown counterpart -> 404
    let resp = client
        .post(format!("{}/api/requests", base_url))
        .json(&json!({
            "userId": user_id,
            "workerId": "no-such-worker",
            "description": "Anything",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Create a real one, then try an unknown status value
    let resp = client
        .post(format!("{}/api/requests", base_url))
        .json(&json!({
            "userId": user_id,
            "workerId": worker_id,
            "description": "Fix the gate",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    let request_id = body["request"]["id"].as_str().unwrap();

    let resp = client
        .patch(format!("{}/api/requests/{}", base_url, request_id))
        .json(&json!({ "status": "paused" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Unknown request id -> 404
    let resp = client
        .patch(format!("{}/api/requests/no-such-request", base_url))
        .json(&json!({ "status": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
