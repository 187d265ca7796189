//! Router tests
//!
//! Requests that fail before touching the database run against a lazily
//! connected pool. The end-to-end flows need Postgres:
//! `DATABASE_URL=... cargo test -p studyctl-server -- --ignored`

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use studyctl_core::models::{ProblemType, UserRole};
use studyctl_core::quota::{QuotaLimit, QuotaLimits};
use studyctl_core::DisabledSynthesizer;
use studyctl_server::{build_router, AccountRepo, AppState, ServiceContext};

fn app_with_pool(pool: PgPool, limits: QuotaLimits) -> Router {
    let services = ServiceContext::new(pool, limits, Arc::new(DisabledSynthesizer));
    build_router(AppState::new(services))
}

/// App whose pool never connects unless a handler reaches the database
fn lazy_app() -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://studyctl@127.0.0.1:1/unreachable")
        .expect("lazy pool");
    app_with_pool(pool, QuotaLimits::default())
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// No database
// =============================================================================

#[tokio::test]
async fn health_needs_no_auth() {
    let response = lazy_app()
        .oneshot(request("GET", "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn missing_token_is_401() {
    let response = lazy_app()
        .oneshot(request("GET", "/v1/workbooks", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "missing bearer token");
}

#[tokio::test]
async fn non_bearer_authorization_is_401() {
    let req = Request::builder()
        .method("GET")
        .uri("/v1/quotas")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = lazy_app().oneshot(req).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "malformed authorization header");
}

#[tokio::test]
async fn every_v1_route_requires_auth() {
    let id = Uuid::new_v4();
    let routes = [
        ("GET", format!("/v1/workbooks/{id}")),
        ("DELETE", format!("/v1/workbooks/{id}?version=1")),
        ("GET", format!("/v1/workbooks/{id}/problems")),
        ("GET", format!("/v1/workbooks/{id}/problems/{id}/audio/{id}/content")),
        ("GET", format!("/v1/study/workbooks/{id}/study-types/memorization/recordbook")),
        ("GET", format!("/v1/study/workbooks/{id}/study-types/dictation/completion-rate")),
    ];

    for (method, uri) in routes {
        let response = lazy_app()
            .oneshot(request(method, &uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = lazy_app()
        .oneshot(request("GET", "/v1/nothing-here", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Database-backed flows
// =============================================================================

struct Fixture {
    app: Router,
    pool: PgPool,
    org: String,
}

impl Fixture {
    async fn new(limits: QuotaLimits) -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = studyctl_server::create_pool(&url).await.unwrap();
        studyctl_server::db::migrations::run(&pool).await.unwrap();
        Self {
            app: app_with_pool(pool.clone(), limits),
            pool,
            org: format!("org-{}", Uuid::new_v4()),
        }
    }

    async fn token(&self, role: UserRole) -> String {
        let repo = AccountRepo::new(&self.pool);
        let org = repo.create_organization(&self.org).await.unwrap();
        let login = format!("user-{}", Uuid::new_v4().simple());
        let user = repo.create_user(org, &login, role).await.unwrap();
        repo.issue_token(user.id, None).await.unwrap()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn create_workbook(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .send(request(
                "POST",
                "/v1/workbooks",
                Some(token),
                Some(json!({"name": name, "problem_type": "english_word"})),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_owned()
    }
}

#[tokio::test]
#[ignore = "requires database"]
async fn unknown_token_is_401() {
    let fx = Fixture::new(QuotaLimits::default()).await;
    let (status, _) = fx
        .send(request("GET", "/v1/workbooks", Some("not-a-token"), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn workbook_problem_and_study_flow() {
    let fx = Fixture::new(QuotaLimits::default()).await;
    let token = fx.token(UserRole::User).await;
    let wb = fx.create_workbook(&token, "Fruit").await;

    let (status, body) = fx
        .send(request(
            "POST",
            &format!("/v1/workbooks/{wb}/problems"),
            Some(&token),
            Some(json!({"properties": {"text": "apple", "translated": "ringo"}})),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let problem = body["id"].as_str().unwrap().to_owned();

    let (status, body) = fx
        .send(request("GET", &format!("/v1/workbooks/{wb}/problems/{problem}"), Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number"], 1);
    assert_eq!(body["properties"]["text"], "apple");

    let (status, _) = fx
        .send(request(
            "POST",
            &format!("/v1/study/workbooks/{wb}/study-types/memorization/problems/{problem}/result"),
            Some(&token),
            Some(json!({"result": true, "memorized": true})),
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = fx
        .send(request(
            "GET",
            &format!("/v1/study/workbooks/{wb}/study-types/memorization/recordbook"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"][0]["record"]["level"], 1);

    let (status, body) = fx
        .send(request(
            "GET",
            &format!("/v1/study/workbooks/{wb}/study-types/memorization/completion-rate"),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rate"], 1.0);

    let (status, body) = fx.send(request("GET", "/v1/quotas", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    let size = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["name"] == "english_wordSize")
        .unwrap();
    assert_eq!(size["used"], 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn malformed_ids_are_400() {
    let fx = Fixture::new(QuotaLimits::default()).await;
    let token = fx.token(UserRole::User).await;
    let (status, body) = fx
        .send(request("GET", "/v1/workbooks/not-a-uuid", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
#[ignore = "requires database"]
async fn stale_version_is_409() {
    let fx = Fixture::new(QuotaLimits::default()).await;
    let token = fx.token(UserRole::User).await;
    let wb = fx.create_workbook(&token, "Versions").await;

    let (status, body) = fx
        .send(request(
            "PUT",
            &format!("/v1/workbooks/{wb}"),
            Some(&token),
            Some(json!({"version": 1, "name": "Versions 2"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);

    let (status, body) = fx
        .send(request("DELETE", &format!("/v1/workbooks/{wb}?version=1"), Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "version_conflict");
}

#[tokio::test]
#[ignore = "requires database"]
async fn size_quota_is_429() {
    let limits = QuotaLimits::with_overrides([(
        ProblemType::EnglishWord,
        QuotaLimit { size: 1, update: 10 },
    )]);
    let fx = Fixture::new(limits).await;
    let token = fx.token(UserRole::User).await;
    let wb = fx.create_workbook(&token, "Tiny").await;
    let uri = format!("/v1/workbooks/{wb}/problems");

    let (status, _) = fx
        .send(request("POST", &uri, Some(&token), Some(json!({"properties": {"text": "one"}}))))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = fx
        .send(request("POST", &uri, Some(&token), Some(json!({"properties": {"text": "two"}}))))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "quota_exceeded");
}

#[tokio::test]
#[ignore = "requires database"]
async fn other_users_workbook_is_403_and_owner_can_read() {
    let fx = Fixture::new(QuotaLimits::default()).await;
    let alice = fx.token(UserRole::User).await;
    let bob = fx.token(UserRole::User).await;
    let boss = fx.token(UserRole::Owner).await;
    let wb = fx.create_workbook(&alice, "Private").await;

    let (status, _) = fx
        .send(request("GET", &format!("/v1/workbooks/{wb}"), Some(&bob), None))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = fx
        .send(request("GET", &format!("/v1/workbooks/{wb}"), Some(&boss), None))
        .await;
    assert_eq!(status, StatusCode::OK);
}
