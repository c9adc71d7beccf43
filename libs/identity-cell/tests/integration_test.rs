use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use identity_cell::{identity_routes, webhook_routes};
use profile_cell::ProfileService;
use shared_database::SupabaseStore;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser, WebhookTestUtils, TEST_WEBHOOK_SECRET};
use shared_utils::AppState;

fn app(state: &AppState) -> Router {
    Router::new()
        .nest("/auth", identity_routes(state.clone()))
        .nest("/webhooks", webhook_routes(state.clone()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", bearer)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn signed_webhook(payload: &Value) -> Request<Body> {
    let raw = payload.to_string();
    let headers = WebhookTestUtils::signed_headers(
        TEST_WEBHOOK_SECRET,
        "msg_test",
        Utc::now().timestamp(),
        raw.as_bytes(),
    );

    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/identity")
        .header("content-type", "application/json");
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(raw)).unwrap()
}

#[tokio::test]
async fn test_sync_creates_then_touches_profile() {
    let state = TestConfig::default().to_state();
    let user = TestUser::new("fresh@example.com", "Fresh", "Face");
    let bearer = JwtTestUtils::bearer(&user, &state.config);

    let response = app(&state)
        .oneshot(post_json("/auth/sync", &bearer, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["externalId"], user.id);
    assert_eq!(json["data"]["role"], Value::Null);

    let response = app(&state)
        .oneshot(post_json("/auth/sync", &bearer, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sync_requires_session() {
    let state = TestConfig::default().to_state();
    let response = app(&state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_complete_profile_created_then_updated() {
    let state = TestConfig::default().to_state();
    let user = TestUser::new("doc@example.com", "Meredith", "Grey");
    let bearer = JwtTestUtils::bearer(&user, &state.config);

    let submission = json!({
        "phone": "+1 555 010 0100",
        "role": "doctor",
        "dateOfBirth": "1979-09-27",
        "gender": "female"
    });

    let response = app(&state)
        .oneshot(post_json("/auth/complete-profile", &bearer, submission.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["role"], "doctor");
    assert_eq!(created["data"]["displayName"], "Meredith Grey");

    let response = app(&state)
        .oneshot(post_json("/auth/complete-profile", &bearer, submission))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["id"], created["data"]["id"]);
}

#[tokio::test]
async fn test_complete_profile_missing_field_is_rejected() {
    let state = TestConfig::default().to_state();
    let user = TestUser::default();
    let bearer = JwtTestUtils::bearer(&user, &state.config);

    let response = app(&state)
        .oneshot(post_json(
            "/auth/complete-profile",
            &bearer,
            json!({ "phone": "555-010-0100", "role": "patient", "gender": "male" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Missing required fields: dateOfBirth");

    let stored = ProfileService::new(state.store.clone()).get_profile(&user.id).await.unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_me_reports_completion_state() {
    let state = TestConfig::default().to_state();
    let user = TestUser::default();
    let bearer = JwtTestUtils::bearer(&user, &state.config);

    app(&state).oneshot(post_json("/auth/sync", &bearer, json!({}))).await.unwrap();

    let response = app(&state)
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .header("authorization", &bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["isComplete"], false);
    assert_eq!(json["data"]["missingFields"], json!(["phone", "role", "dateOfBirth", "gender"]));
}

#[tokio::test]
async fn test_webhook_missing_headers_rejected_before_mutation() {
    let state = TestConfig::default().to_state();
    let user = TestUser::default();
    let bearer = JwtTestUtils::bearer(&user, &state.config);
    app(&state).oneshot(post_json("/auth/sync", &bearer, json!({}))).await.unwrap();

    let response = app(&state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/identity")
                .header("content-type", "application/json")
                .body(Body::from(WebhookTestUtils::user_deleted_event(&user.id).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let stored = ProfileService::new(state.store.clone()).get_profile(&user.id).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_webhook_bad_signature_rejected_before_mutation() {
    let state = TestConfig::default().to_state();
    let user = TestUser::default();
    let bearer = JwtTestUtils::bearer(&user, &state.config);
    app(&state).oneshot(post_json("/auth/sync", &bearer, json!({}))).await.unwrap();

    let signed_for = WebhookTestUtils::user_deleted_event("user_someone_else");
    let headers = WebhookTestUtils::signed_headers(
        TEST_WEBHOOK_SECRET,
        "msg_forged",
        Utc::now().timestamp(),
        signed_for.to_string().as_bytes(),
    );

    let mut builder = Request::builder().method("POST").uri("/webhooks/identity");
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    let request = builder
        .body(Body::from(WebhookTestUtils::user_deleted_event(&user.id).to_string()))
        .unwrap();

    let response = app(&state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let stored = ProfileService::new(state.store.clone()).get_profile(&user.id).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_webhook_update_and_delete_events() {
    let state = TestConfig::default().to_state();
    let user = TestUser::new("before@example.com", "Before", "Update");
    let bearer = JwtTestUtils::bearer(&user, &state.config);
    app(&state).oneshot(post_json("/auth/sync", &bearer, json!({}))).await.unwrap();

    let update = WebhookTestUtils::user_updated_event(&user.id, "after@example.com", "After", "Update");
    let response = app(&state).oneshot(signed_webhook(&update)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["changed"], true);

    let profiles = ProfileService::new(state.store.clone());
    let stored = profiles.get_profile(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.email.as_deref(), Some("after@example.com"));
    assert_eq!(stored.display_name.as_deref(), Some("After Update"));

    let delete = WebhookTestUtils::user_deleted_event(&user.id);
    let response = app(&state).oneshot(signed_webhook(&delete)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(profiles.get_profile(&user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_webhook_delete_for_unknown_identity_is_noop() {
    let state = TestConfig::default().to_state();
    let delete = WebhookTestUtils::user_deleted_event("user_never_seen");

    let response = app(&state).oneshot(signed_webhook(&delete)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["handled"], true);
    assert_eq!(json["data"]["changed"], false);
}

#[tokio::test]
async fn test_webhook_unknown_event_type_is_acknowledged() {
    let state = TestConfig::default().to_state();
    let event = json!({ "type": "session.created", "data": { "id": "sess_1" } });

    let response = app(&state).oneshot(signed_webhook(&event)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["handled"], false);
}

#[tokio::test]
async fn test_sync_against_rest_store() {
    let mock_server = MockServer::start().await;
    let config = TestConfig {
        database_url: mock_server.uri(),
        ..TestConfig::default()
    }
    .to_app_config();
    let store = Arc::new(SupabaseStore::new(&config).unwrap());
    let state = AppState::new(config, store);

    let user = TestUser::new("rest@example.com", "Rest", "User");
    let now = Utc::now().to_rfc3339();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "8f7c2b8e-7f0a-4d8e-9b8a-3f0c7a1d2e4b",
            "externalId": user.id,
            "email": "rest@example.com",
            "displayName": "Rest User",
            "firstName": "Rest",
            "lastName": "User",
            "phone": null,
            "role": null,
            "dateOfBirth": null,
            "gender": null,
            "photoUrl": null,
            "isActive": true,
            "lastLoginAt": now,
            "createdAt": now,
            "updatedAt": now
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let bearer = JwtTestUtils::bearer(&user, &state.config);
    let response = app(&state)
        .oneshot(post_json("/auth/sync", &bearer, json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["externalId"], user.id);
}
