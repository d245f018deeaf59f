#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use folio::accounts;
use folio::bootstrap;
use folio::config::Config;
use folio::db::models::User;
use folio::db::{self, users};
use folio::forms::RegisterForm;
use folio::mail::{ContactMessage, MailError, Mailer};
use folio::state::{AppState, DbPool};

pub const ADMIN_EMAIL: &str = "admin@email.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const PASSWORD: &str = "Abcdef1!";

/// Keeps every contact message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<ContactMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_contact(&self, _message: &ContactMessage) -> Result<(), MailError> {
        Err(MailError::Disabled)
    }
}

/// Takes its time and then fails, like an SMTP relay that never answers.
pub struct SlowMailer(pub Duration);

#[async_trait]
impl Mailer for SlowMailer {
    async fn send_contact(&self, _message: &ContactMessage) -> Result<(), MailError> {
        tokio::time::sleep(self.0).await;
        Err(MailError::Disabled)
    }
}

impl RecordingMailer {
    /// Wait for background sends to land, giving up after a second.
    pub async fn wait_for(&self, count: usize) -> Vec<ContactMessage> {
        for _ in 0..100 {
            {
                let sent = self.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent.lock().unwrap().clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub config: Config,
    _dir: TempDir,
}

impl TestApp {
    /// A fresh app on its own database with the super-admin seeded.
    pub fn new() -> Self {
        Self::with_mailer(Arc::new(RecordingMailer::default()))
    }

    pub fn with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.database.path = Some(dir.path().join("test.db"));
        config.auth.secret_key = Some("integration-test-secret".to_string());
        config.auth.bcrypt_cost = 4;
        config.admin.email = Some(ADMIN_EMAIL.to_string());

        let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");
        {
            let mut conn = pool.get().unwrap();
            bootstrap::ensure_super_admin(&mut conn, &config.admin, config.auth.bcrypt_cost)
                .expect("Bootstrap failed");
        }

        let state = AppState::new(pool.clone(), config.clone(), mailer);
        Self {
            router: folio::routes::app(state),
            pool,
            config,
            _dir: dir,
        }
    }

    pub fn client(&self) -> Client {
        Client {
            router: self.router.clone(),
            cookies: HashMap::new(),
        }
    }

    /// Register an account directly, optionally granting admin rights.
    pub fn seed_user(&self, username: &str, is_admin: bool) -> User {
        let conn = self.pool.get().unwrap();
        let form = RegisterForm {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: PASSWORD.to_string(),
            confirm_password: PASSWORD.to_string(),
            agree_to_terms: Some("y".to_string()),
        };
        let user = accounts::register(&conn, &form, 4).expect("Failed to seed user");
        if is_admin {
            users::set_admin(&conn, user.id, true).unwrap();
        }
        users::get(&conn, user.id).unwrap()
    }

    pub fn count(&self, sql: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Drives the router in-process, carrying cookies between requests like a browser.
pub struct Client {
    router: Router,
    cookies: HashMap<String, String>,
}

impl Client {
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn login_as(&mut self, user: &User) -> TestResponse {
        let response = self.login(&user.email, PASSWORD).await;
        assert_eq!(response.location.as_deref(), Some("/"), "login should succeed");
        response
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let raw = set_cookie.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
