//! Shared fixtures for the API integration tests: in-memory adapters for every
//! port and helpers that drive the real router with `oneshot`.

#![allow(dead_code)]

use api_lib::config::{Config, DEFAULT_GENERATION_API_BASE};
use api_lib::web::{self, state::AppState};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tutor_core::domain::{NewUser, TokenPurpose, UserCredentials, UserRecord};
use tutor_core::ports::{
    DatabaseService, GenerationReply, GenerationRequest, GenerationService, MailService,
    PortError, PortResult,
};
use tutor_core::validation::DEFAULT_ALLOWED_DOMAINS;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@gmail.com";
pub const PASSWORD: &str = "secret123";

//=========================================================================================
// In-Memory Record Store
//=========================================================================================

#[derive(Default)]
struct Store {
    users: HashMap<Uuid, (UserRecord, String)>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    tokens: HashMap<String, (Uuid, TokenPurpose, DateTime<Utc>)>,
}

#[derive(Default)]
pub struct MemoryDb {
    store: Mutex<Store>,
}

impl MemoryDb {
    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }

    pub fn session_count(&self) -> usize {
        self.store.lock().unwrap().sessions.len()
    }

    /// Moves every email token's expiry into the past.
    pub fn expire_email_tokens(&self) {
        let past = Utc::now() - Duration::minutes(1);
        for (_, _, expires_at) in self.store.lock().unwrap().tokens.values_mut() {
            *expires_at = past;
        }
    }

    /// Moves every session's expiry into the past.
    pub fn expire_sessions(&self) {
        let past = Utc::now() - Duration::minutes(1);
        for (_, expires_at) in self.store.lock().unwrap().sessions.values_mut() {
            *expires_at = past;
        }
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        self.store
            .lock()
            .unwrap()
            .users
            .values()
            .find(|(user, _)| user.email == email)
            .map(|(user, _)| user.clone())
    }
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn create_user(&self, user: NewUser) -> PortResult<UserRecord> {
        let mut store = self.store.lock().unwrap();
        if store.users.values().any(|(u, _)| u.email == user.email) {
            return Err(PortError::Conflict(format!("Email {} is already registered", user.email)));
        }
        let record = UserRecord {
            user_id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            is_banned: false,
            email_verified: false,
            created_at: Utc::now(),
        };
        store
            .users
            .insert(record.user_id, (record.clone(), user.hashed_password));
        Ok(record)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<UserRecord> {
        self.store
            .lock()
            .unwrap()
            .users
            .get(&user_id)
            .map(|(user, _)| user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.store
            .lock()
            .unwrap()
            .users
            .values()
            .find(|(user, _)| user.email == email)
            .map(|(user, hash)| UserCredentials {
                user_id: user.user_id,
                email: user.email.clone(),
                hashed_password: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn list_users(&self) -> PortResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self
            .store
            .lock()
            .unwrap()
            .users
            .values()
            .map(|(user, _)| user.clone())
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn set_user_banned(&self, user_id: Uuid, banned: bool) -> PortResult<UserRecord> {
        let mut store = self.store.lock().unwrap();
        let (user, _) = store
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        user.is_banned = banned;
        Ok(user.clone())
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> PortResult<()> {
        let mut store = self.store.lock().unwrap();
        let (user, _) = store
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        user.email_verified = true;
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut store = self.store.lock().unwrap();
        let (_, hash) = store
            .users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        *hash = hashed_password.to_string();
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.store
            .lock()
            .unwrap()
            .sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.store.lock().unwrap().sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.store.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn delete_auth_sessions_for_user(&self, user_id: Uuid) -> PortResult<()> {
        self.store
            .lock()
            .unwrap()
            .sessions
            .retain(|_, (owner, _)| *owner != user_id);
        Ok(())
    }

    async fn create_email_token(
        &self,
        token: &str,
        user_id: Uuid,
        purpose: TokenPurpose,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.store
            .lock()
            .unwrap()
            .tokens
            .insert(token.to_string(), (user_id, purpose, expires_at));
        Ok(())
    }

    async fn consume_email_token(&self, token: &str, purpose: TokenPurpose) -> PortResult<Uuid> {
        let invalid = || PortError::Invalid("Invalid or expired token".to_string());
        let mut store = self.store.lock().unwrap();
        match store.tokens.get(token) {
            Some((_, stored, _)) if *stored != purpose => return Err(invalid()),
            None => return Err(invalid()),
            _ => {}
        }
        let (user_id, _, expires_at) = store.tokens.remove(token).ok_or_else(invalid)?;
        if expires_at <= Utc::now() {
            return Err(invalid());
        }
        Ok(user_id)
    }
}

//=========================================================================================
// Recording Mailer
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub kind: &'static str,
    pub to: String,
    pub link: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    /// While set, every delivery fails and nothing is recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// The token from the most recent mail of `kind` sent to `to`.
    pub fn last_token(&self, kind: &str, to: &str) -> String {
        let mail = self
            .sent()
            .into_iter()
            .rev()
            .find(|m| m.kind == kind && m.to == to)
            .unwrap_or_else(|| panic!("no {} mail sent to {}", kind, to));
        mail.link
            .split("token=")
            .nth(1)
            .expect("link carries a token")
            .to_string()
    }

    fn record(&self, kind: &'static str, to: &str, link: &str) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("mail relay is down".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            kind,
            to: to.to_string(),
            link: link.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl MailService for RecordingMailer {
    async fn send_email_verification(&self, email: &str, link: &str) -> PortResult<()> {
        self.record("verify", email, link)
    }

    async fn send_password_reset(&self, email: &str, link: &str) -> PortResult<()> {
        self.record("reset", email, link)
    }
}

//=========================================================================================
// Scripted Generation Service
//=========================================================================================

#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<PortResult<GenerationReply>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn push(&self, reply: PortResult<GenerationReply>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> PortResult<GenerationReply> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no scripted reply left".to_string())))
    }
}

pub fn bundle_json() -> Value {
    json!({
        "mindMap": "Photosynthesis\n- Light reactions\n- Calvin cycle",
        "revisionNotes": "Plants convert light energy into chemical energy.",
        "questionsAndAnswers": "Q: Where does it happen? A: In chloroplasts.",
        "keywords": [{ "keyword": "Chlorophyll", "definition": "The green pigment that absorbs light." }],
        "cbseMarkingScheme": "1 mark for the equation, 2 marks for the explanation.",
        "mnemonics": "Light Makes Sugar",
        "pyqs": "Explain the role of chlorophyll. (2019)"
    })
}

//=========================================================================================
// Test Application
//=========================================================================================

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        gemini_api_key: None,
        generation_api_base: DEFAULT_GENERATION_API_BASE.to_string(),
        tutor_model: "gemini-2.5-flash".to_string(),
        allowed_email_domains: DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        session_ttl_days: 30,
        cors_origin: "http://localhost:3000".to_string(),
        app_base_url: "http://localhost:3000".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<MemoryDb>,
    pub mailer: Arc<RecordingMailer>,
    pub generator: Arc<ScriptedGenerator>,
}

pub fn test_app() -> TestApp {
    let generator = Arc::new(ScriptedGenerator::default());
    let mut app = test_app_with(generator.clone());
    app.generator = generator;
    app
}

/// Builds the app around any generation backend; the returned `generator` is then unused.
pub fn test_app_with(generation: Arc<dyn GenerationService>) -> TestApp {
    let db = Arc::new(MemoryDb::default());
    let mailer = Arc::new(RecordingMailer::default());
    let state = Arc::new(AppState::new(
        Arc::new(test_config()),
        db.clone(),
        mailer.clone(),
        generation,
    ));
    TestApp {
        router: web::router(state),
        db,
        mailer,
        generator: Arc::new(ScriptedGenerator::default()),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.send(Method::POST, uri, Some(body), cookie).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, None, cookie).await
    }

    pub async fn signup(&self, name: &str, email: &str) -> TestResponse {
        self.post(
            "/auth/signup",
            json!({ "name": name, "email": email, "password": PASSWORD }),
            None,
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post("/auth/login", json!({ "email": email, "password": password }), None)
            .await
    }

    /// Signs up, verifies and logs in; returns the `session=...` cookie pair.
    pub async fn signed_in(&self, name: &str, email: &str) -> String {
        assert_eq!(self.signup(name, email).await.status, StatusCode::CREATED);
        let token = self.mailer.last_token("verify", email);
        let verified = self
            .post("/auth/verify-email", json!({ "token": token }), None)
            .await;
        assert_eq!(verified.status, StatusCode::OK);

        let login = self.login(email, PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK);
        session_cookie(&login)
    }
}

/// Extracts `session=<id>` from a response's `Set-Cookie` header.
pub fn session_cookie(response: &TestResponse) -> String {
    response
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("response sets a session cookie")
        .to_string()
}
