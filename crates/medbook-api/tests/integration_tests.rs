//! Integration tests for the Medbook HTTP API.
//!
//! Each test builds its own router over a fresh dialog service that uses
//! the pattern classifier and a clock fixed at Friday 16 October 2026, 09:30.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;

use medbook_api::create_router;
use medbook_api::handlers::{DoctorsResponse, HealthResponse, SessionsResponse};
use medbook_api::state::AppState;
use medbook_core::config::ApiConfig;
use medbook_core::{MedbookConfig, UserId};
use medbook_dialog::{DialogService, FixedClock, IntentLabels, LogTransport, LoggingBackend};
use medbook_nlu::PatternClassifier;

// =============================================================================
// Helpers
// =============================================================================

const TEST_TOKEN: &str = "test-token-12345";

fn make_state_with(token: Option<&str>, rate_limit_per_sec: u64) -> AppState {
    let config = MedbookConfig::default();
    let directory = Arc::new(config.directory().unwrap());
    let classifier =
        PatternClassifier::new(Arc::clone(&directory), IntentLabels::from(&config.dialog)).unwrap();
    let now = NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    let service = DialogService::from_config(
        &config,
        Arc::new(classifier),
        Arc::new(LogTransport),
        Arc::new(LoggingBackend),
    )
    .unwrap()
    .with_clock(Arc::new(FixedClock(now)));

    let api = ApiConfig {
        rate_limit_per_sec,
        ..ApiConfig::default()
    };
    AppState::new(service, api, token.map(str::to_string))
}

fn make_state() -> AppState {
    make_state_with(Some(TEST_TOKEN), 0)
}

fn make_app() -> axum::Router {
    create_router(make_state())
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

fn authed_delete(uri: &str) -> Request<Body> {
    Request::delete(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

fn chat_request(user_id: &str, text: &str) -> Request<Body> {
    let body = serde_json::json!({ "user_id": user_id, "text": text });
    Request::post("/chat")
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

/// Send one chat message and return the decoded reply.
async fn say(app: &axum::Router, user_id: &str, text: &str) -> Value {
    let resp = app.clone().oneshot(chat_request(user_id, text)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "message {:?}", text);
    body_json(resp).await
}

// =============================================================================
// Public endpoints (no auth required)
// =============================================================================

#[tokio::test]
async fn test_health_happy_path() {
    let app = make_app();
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let health: HealthResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.active_sessions, 0);
}

#[tokio::test]
async fn test_doctors_listed_in_order() {
    let app = make_app();
    let resp = app
        .oneshot(Request::get("/doctors").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: DoctorsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    let names: Vec<&str> = body.doctors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Josh Stammer, M.D.",
            "Christine Collins, M.D.",
            "Abraham Brown, M.D."
        ]
    );
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_chat_requires_auth() {
    let app = make_app();
    let resp = app
        .oneshot(
            Request::post("/chat")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"user_id":"u1","text":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let app = make_app();
    let resp = app
        .oneshot(
            Request::get("/sessions")
                .header("authorization", "Bearer nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_no_token_configured_disables_auth() {
    let app = create_router(make_state_with(None, 0));
    let resp = app
        .oneshot(Request::get("/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_multi_turn_booking() {
    let app = make_app();

    let reply = say(&app, "u1", "I want to book an appointment").await;
    assert_eq!(reply["intent"], "booking");
    assert!(reply["answer"]
        .as_str()
        .unwrap()
        .starts_with("Please choose the doctor out of the available:"));

    let reply = say(&app, "u1", "Josh").await;
    assert_eq!(reply["answer"], "Please enter the date");

    let reply = say(&app, "u1", "next Monday").await;
    assert_eq!(reply["answer"], "Please enter the time");

    let reply = say(&app, "u1", "10am").await;
    assert_eq!(reply["intent"], "booking");
    assert_eq!(
        reply["answer"],
        "Your reservation with Josh Stammer, M.D. was made. \
         Time: Monday, October 19 2026 at 10:00. Thanks for working with us!"
    );
}

#[tokio::test]
async fn test_single_message_booking() {
    let app = make_app();
    let reply = say(&app, "u1", "Book Dr. Collins on October 20 at 3:30 pm please").await;
    let answer = reply["answer"].as_str().unwrap();
    assert!(answer.contains("Christine Collins, M.D."), "{}", answer);
    assert!(answer.contains("Tuesday, October 20 2026 at 15:30"), "{}", answer);
}

#[tokio::test]
async fn test_past_time_is_rejected() {
    let app = make_app();
    let reply = say(&app, "u1", "book Abraham yesterday at 10am").await;
    assert_eq!(
        reply["answer"],
        "Sorry, you've provided an unavailable time or date. Please repeat again"
    );

    // The doctor is kept; a new time completes the booking.
    let reply = say(&app, "u1", "tomorrow at 11am").await;
    assert!(reply["answer"]
        .as_str()
        .unwrap()
        .contains("Abraham Brown, M.D."));
}

#[tokio::test]
async fn test_redirect_to_human() {
    let app = make_app();
    let reply = say(&app, "u1", "Let me talk to a human").await;
    assert_eq!(reply["intent"], "redirect_to_human");
    assert_eq!(reply["answer"], "Redirecting to a human manager");
}

#[tokio::test]
async fn test_unclassified_message() {
    let app = make_app();
    let reply = say(&app, "u1", "purple monkey dishwasher").await;
    assert_eq!(reply["intent"], "unclassified");
    assert_eq!(
        reply["answer"],
        "Sorry, I didn't quite get you. Could you paraphrase it?"
    );
}

#[tokio::test]
async fn test_greeting_answer_passes_through() {
    let app = make_app();
    let reply = say(&app, "u1", "Hello").await;
    assert_eq!(reply["intent"], "greetings.hello");
    assert!(reply["answer"].is_string());
}

#[tokio::test]
async fn test_users_are_isolated() {
    let app = make_app();
    say(&app, "alice", "book Josh").await;
    let reply = say(&app, "bob", "Josh").await;
    // Bob has no pending booking, so a bare name is not understood.
    assert_eq!(reply["intent"], "unclassified");
}

#[tokio::test]
async fn test_empty_text_is_bad_request() {
    let app = make_app();
    let resp = app.oneshot(chat_request("u1", "   ")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "bad_request");
}

#[tokio::test]
async fn test_empty_user_id_is_bad_request() {
    let app = make_app();
    let resp = app.oneshot(chat_request(" ", "book")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlong_text_is_rejected() {
    let app = make_app();
    let text = "a".repeat(2001);
    let resp = app.oneshot(chat_request("u1", &text)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_sessions_listed_after_chat() {
    let app = make_app();
    say(&app, "alice", "book").await;
    say(&app, "bob", "hello").await;

    let resp = app.oneshot(authed_get("/sessions")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: SessionsResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body.total, 2);
    let mut users: Vec<&str> = body.sessions.iter().map(|s| s.user_id.as_str()).collect();
    users.sort();
    assert_eq!(users, vec!["alice", "bob"]);
    assert!(body.sessions.iter().all(|s| s.created_at.is_some()));
}

#[tokio::test]
async fn test_delete_session() {
    let app = make_app();
    say(&app, "alice", "book").await;

    let resp = app.clone().oneshot(authed_delete("/sessions/alice")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.oneshot(authed_delete("/sessions/alice")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_session_mid_turn_conflicts() {
    let state = make_state();
    let session = state
        .service
        .registry()
        .get_or_create(&UserId::from("alice"))
        .unwrap();
    let app = create_router(state);

    let turn = session.lock().await;
    let resp = app.clone().oneshot(authed_delete("/sessions/alice")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(resp).await["error"], "conflict");

    drop(turn);
    let resp = app.oneshot(authed_delete("/sessions/alice")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_deleted_session_forgets_pending_booking() {
    let app = make_app();
    say(&app, "alice", "book").await;
    app.clone()
        .oneshot(authed_delete("/sessions/alice"))
        .await
        .unwrap();

    let reply = say(&app, "alice", "Josh").await;
    assert_eq!(reply["intent"], "unclassified");
}

#[tokio::test]
async fn test_purge_without_ttl_removes_nothing() {
    let app = make_app();
    say(&app, "alice", "book").await;

    let resp = app
        .oneshot(
            Request::post("/sessions/purge")
                .header("authorization", format!("Bearer {}", TEST_TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["purged"], 0);
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn test_rate_limit_applies_to_protected_routes() {
    let app = create_router(make_state_with(Some(TEST_TOKEN), 1));
    let mut statuses = Vec::new();
    for _ in 0..3 {
        let resp = app.clone().oneshot(authed_get("/sessions")).await.unwrap();
        statuses.push(resp.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));

    // Public routes are not limited.
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
