//! Integration test harness for Emporium.
//!
//! Tests drive the complete router in-process with
//! `tower::ServiceExt::oneshot`, backed by a fresh [`MemoryStore`] per test.
//! No database or listening socket is involved.
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use emporium_api::config::{ApiConfig, AuthConfig};
use emporium_api::db::{MemoryStore, Store};
use emporium_api::state::AppState;
use emporium_core::Role;

/// Secret used to sign tokens in tests.
pub const TEST_SECRET: &str = "q7Lm2Xv9Rt4Wz8Kp3Nb6Yc1Hd5Gf0Js";

/// Password used by [`TestApp::signup`].
pub const TEST_PASSWORD: &str = "correct-horse-42";

/// Auth settings used by the test app.
#[must_use]
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        token_secret: SecretString::from(TEST_SECRET.to_owned()),
        access_token_ttl: chrono::Duration::hours(24),
        refresh_token_ttl: chrono::Duration::hours(168),
    }
}

/// Full configuration for the test app.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused".to_owned()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        auth: test_auth_config(),
        request_timeout: Duration::from_secs(5),
        cors_origins: Vec::new(),
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A JSON response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// A signed-up user and the tokens issued to it.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
    pub refresh_token: String,
}

/// The application router plus direct access to its store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config(), store.clone());

        Self {
            store,
            router: emporium_api::app(state),
        }
    }

    /// Send a request and decode the JSON body (`Null` when empty).
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body can't be read.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(request).await
    }

    /// Send a prepared request.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body can't be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Sign up `username` with [`TEST_PASSWORD`].
    ///
    /// # Panics
    ///
    /// Panics if signup doesn't return 201.
    pub async fn signup(&self, username: &str) -> TestUser {
        let response = self
            .post("/users/signup", None, signup_body(username, TEST_PASSWORD))
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "signup failed: {}",
            response.body
        );
        TestUser::from_auth_body(username, &response.body)
    }

    /// Sign up `username`, promote it to admin and log in again so the
    /// token carries the new role.
    ///
    /// # Panics
    ///
    /// Panics if any step fails.
    pub async fn admin(&self, username: &str) -> TestUser {
        self.signup(username).await;
        self.store
            .set_user_role(username, Role::Admin)
            .await
            .expect("Failed to promote user");

        let response = self
            .post(
                "/users/login",
                None,
                json!({ "username": username, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        TestUser::from_auth_body(username, &response.body)
    }

    /// Create a product through the admin API and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the product isn't created.
    pub async fn add_product(&self, admin: &TestUser, name: &str, price: &str) -> i64 {
        let response = self
            .post(
                "/admin/add_product",
                Some(&admin.token),
                product_body(name, price),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "add_product failed: {}",
            response.body
        );
        response.body["id"].as_i64().expect("product id")
    }
}

impl TestUser {
    fn from_auth_body(username: &str, body: &Value) -> Self {
        Self {
            id: body["user"]["id"].as_i64().expect("user id"),
            username: username.to_owned(),
            token: body["token"].as_str().expect("token").to_owned(),
            refresh_token: body["refresh_token"]
                .as_str()
                .expect("refresh_token")
                .to_owned(),
        }
    }
}

/// A valid signup body.
#[must_use]
pub fn signup_body(username: &str, password: &str) -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "username": username,
        "password": password,
        "email": format!("{username}@example.com"),
        "phone": "+44 20 7946 0000",
        "address": {
            "street": "12 Analytical Row",
            "city": "London",
            "state": "Greater London",
            "zip_code": "N1 9GU",
            "country": "UK"
        }
    })
}

/// A valid product body.
#[must_use]
pub fn product_body(name: &str, price: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} for testing"),
        "price": price,
        "rating": 4.5,
        "image": "https://cdn.example.com/products/item.png"
    })
}
