#![allow(dead_code)]

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use ptw_core::ptw_form::{ChecklistAnswer, CATEGORIES};
use ptw_db::models::site::{CreateSite, Site};
use ptw_db::models::user::{CreateUser, User};
use ptw_db::repositories::{SiteRepo, UserRepo};
use serde_json::Value;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use ptw_api::auth::jwt::{generate_access_token, JwtConfig};
use ptw_api::auth::password::hash_password;
use ptw_api::config::ServerConfig;
use ptw_api::router::build_app_router;
use ptw_api::state::AppState;

pub const TEST_PASSWORD: &str = "permit-to-work-1";
pub const TEST_MAX_UPLOAD_BYTES: u64 = 64 * 1024;

const BOUNDARY: &str = "ptw-integration-boundary";

/// Build a test `ServerConfig` with safe defaults, writing uploads to
/// `upload_dir`.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        upload_dir: upload_dir.to_path_buf(),
        upload_max_bytes: TEST_MAX_UPLOAD_BYTES,
        jwt: test_jwt(),
    }
}

pub fn test_jwt() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret-long-enough".to_string(),
        access_token_expiry_hours: 24,
        reset_token_expiry_mins: 60,
    }
}

/// The production router over a test pool, plus the temporary upload
/// directory it writes to (removed on drop).
pub struct TestApp {
    pub router: Router,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn upload_path(&self, stored_name: &str) -> PathBuf {
        self.uploads.path().join(stored_name)
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let uploads = tempfile::tempdir().expect("temp upload dir");
    let config = test_config(uploads.path());
    let state = AppState::new(pool, config.clone());
    TestApp {
        router: build_app_router(state, &config),
        uploads,
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

fn create_user_input(user_id: &str, user_type: &str, password_hash: String) -> CreateUser {
    CreateUser {
        user_id: user_id.to_string(),
        name: format!("{user_id} Name"),
        email: format!("{}@test.com", user_id.to_lowercase()),
        password_hash,
        user_type: user_type.to_string(),
        domain: None,
        contact: None,
        location: None,
        city: None,
        state: None,
    }
}

/// Insert a user that authenticates via [`token_for`] only.
pub async fn seed_user(pool: &PgPool, user_id: &str, user_type: &str) -> User {
    UserRepo::create(
        pool,
        &create_user_input(user_id, user_type, "not-a-phc-hash".to_string()),
    )
    .await
    .expect("user creation should succeed")
}

/// Insert a user whose password is [`TEST_PASSWORD`], for login tests.
pub async fn seed_user_with_password(pool: &PgPool, user_id: &str, user_type: &str) -> User {
    let hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(pool, &create_user_input(user_id, user_type, hash))
        .await
        .expect("user creation should succeed")
}

pub async fn seed_site(pool: &PgPool, site_id: &str) -> Site {
    SiteRepo::create(
        pool,
        &CreateSite {
            site_id: site_id.to_string(),
            site_name: format!("{site_id} Plant"),
            location: Some("North yard".to_string()),
            latitude: None,
            longitude: None,
            city: Some("Pune".to_string()),
            state: None,
        },
    )
    .await
    .expect("site creation should succeed")
}

/// Mint an access token for a seeded user without going through login.
pub fn token_for(user: &User) -> String {
    generate_access_token(user, &test_jwt()).expect("token generation")
}

/// A checklist answering every item with `answer`.
pub fn full_checklist(answer: ChecklistAnswer) -> Value {
    let mut root = serde_json::Map::new();
    for category in &CATEGORIES {
        let items: serde_json::Map<String, Value> = category
            .items
            .iter()
            .map(|item| (item.to_string(), serde_json::to_value(answer).unwrap()))
            .collect();
        root.insert(category.key.to_string(), Value::Object(items));
    }
    Value::Object(root)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, None, &body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, Some(token), &body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, Some(token), &body)).await
}

pub async fn put_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(content);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.bytes
    }
}

pub async fn put_multipart_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: MultipartBody,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body.finish()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
