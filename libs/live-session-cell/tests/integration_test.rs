use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use live_session_cell::live_session_routes;
use shared_database::{Collection, InMemoryStore, SupabaseStore};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};
use shared_utils::AppState;

struct Harness {
    store: Arc<InMemoryStore>,
    state: AppState,
    bearer: String,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(TestConfig::default().to_app_config(), store.clone());
        let bearer = JwtTestUtils::bearer(&TestUser::default(), &state.config);
        Self { store, state, bearer }
    }

    fn app(&self) -> Router {
        Router::new().nest("/live-sessions", live_session_routes(self.state.clone()))
    }

    async fn create(&self, body: Value) -> axum::response::Response {
        self.app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/live-sessions")
                    .header("authorization", &self.bearer)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.app()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("authorization", &self.bearer)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn session(name: &str, doctor: &str) -> Value {
    json!({ "sessionName": name, "sessionUrl": "https://meet/x", "doctorId": doctor })
}

#[tokio::test]
async fn test_create_session_returns_created_record() {
    let harness = Harness::new();

    let response = harness.create(session("Jane Doe", "doc1")).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["sessionName"], "Jane Doe");
    assert_eq!(json["data"]["sessionUrl"], "https://meet/x");
    assert_eq!(json["data"]["doctorId"], "doc1");
    assert!(json["data"]["id"].as_str().is_some());
    assert!(json["data"]["createdAt"].as_str().is_some());
}

#[tokio::test]
async fn test_create_session_without_name_is_rejected() {
    let harness = Harness::new();

    let response = harness
        .create(json!({ "sessionUrl": "https://meet/x", "doctorId": "doc1" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
    assert_eq!(harness.store.count(Collection::LiveSessions).await, 0);
}

#[tokio::test]
async fn test_create_session_rejects_non_string_doctor_id() {
    let harness = Harness::new();

    for doctor_id in [json!(42), json!({ "$oid": "abc" }), json!(["doc1"]), json!("")] {
        let response = harness
            .create(json!({ "sessionName": "Visit", "sessionUrl": "https://meet/x", "doctorId": doctor_id }))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert_eq!(harness.store.count(Collection::LiveSessions).await, 0);
}

#[tokio::test]
async fn test_doctor_listing_only_returns_that_doctor_newest_first() {
    let harness = Harness::new();

    harness.create(session("Morning", "doc1")).await;
    harness.create(session("Elsewhere", "doc2")).await;
    harness.create(session("Evening", "doc1")).await;

    let response = harness.get("/live-sessions/doctor?doctorId=doc1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["sessionName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Evening", "Morning"]);
}

#[tokio::test]
async fn test_patient_listing_returns_every_session() {
    let harness = Harness::new();

    harness.create(session("A", "doc1")).await;
    harness.create(session("B", "doc2")).await;

    let response = harness.get("/live-sessions/patient?patientId=any-id").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_listings_require_their_id() {
    let harness = Harness::new();

    assert_eq!(harness.get("/live-sessions/doctor").await.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.get("/live-sessions/patient").await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_routes_require_a_session_token() {
    let harness = Harness::new();

    let response = harness
        .app()
        .oneshot(
            Request::builder()
                .uri("/live-sessions/doctor?doctorId=doc1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_internal_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/live_sessions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig {
        database_url: mock_server.uri(),
        ..TestConfig::default()
    }
    .to_app_config();
    let store = Arc::new(SupabaseStore::new(&config).unwrap());
    let state = AppState::new(config, store);
    let bearer = JwtTestUtils::bearer(&TestUser::default(), &state.config);

    let response = Router::new()
        .nest("/live-sessions", live_session_routes(state))
        .oneshot(
            Request::builder()
                .uri("/live-sessions/doctor?doctorId=doc1")
                .header("authorization", bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Internal server error");
}
