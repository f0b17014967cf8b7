#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};
use skyportal::{ServerConfig, cli::Environment, create_app};
use url::Url;

/// What the fake auth service answers on `/auth/refresh-token`.
#[derive(Clone, Debug)]
pub enum RefreshReply {
    Token(String),
    Status(u16),
    /// 200 with a body that has no accessToken
    Malformed,
}

/// Requests the fake auth service has seen.
#[derive(Default, Debug)]
pub struct Recorded {
    /// Cookie header of each refresh call
    pub refresh_cookies: Vec<Option<String>>,
    /// Cookie header of each logout call
    pub logout_cookies: Vec<Option<String>>,
    /// Path, Authorization header and body of each form post
    /// (login, signup, google, change-password)
    pub forms: Vec<(String, Option<String>, Value)>,
    /// Authorization header of each permissions call
    pub permission_auth: Vec<Option<String>>,
}

struct FakeState {
    refresh: Mutex<RefreshReply>,
    logout_status: Mutex<u16>,
    forms: Mutex<HashMap<String, (u16, Value)>>,
    permissions: Mutex<(u16, Value)>,
    recorded: Mutex<Recorded>,
}

/// Auth service stand-in running on an ephemeral local port.
pub struct FakeAuth {
    pub url: Url,
    state: Arc<FakeState>,
    server_handle: tokio::task::JoinHandle<()>,
}

impl Drop for FakeAuth {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

fn header_of(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn cookie_of(headers: &HeaderMap) -> Option<String> {
    header_of(headers, header::COOKIE)
}

async fn refresh(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state
        .recorded
        .lock()
        .unwrap()
        .refresh_cookies
        .push(cookie_of(&headers));

    let reply = state.refresh.lock().unwrap().clone();
    match reply {
        RefreshReply::Token(token) => Json(json!({ "accessToken": token })).into_response(),
        RefreshReply::Status(status) => (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({ "message": "refresh rejected" })),
        )
            .into_response(),
        RefreshReply::Malformed => Json(json!({ "token": "wrong-field" })).into_response(),
    }
}

async fn logout(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> StatusCode {
    state
        .recorded
        .lock()
        .unwrap()
        .logout_cookies
        .push(cookie_of(&headers));
    StatusCode::from_u16(*state.logout_status.lock().unwrap()).unwrap()
}

async fn form(
    State(state): State<Arc<FakeState>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = uri.path().to_string();
    let auth = header_of(&headers, header::AUTHORIZATION);
    state
        .recorded
        .lock()
        .unwrap()
        .forms
        .push((path.clone(), auth, body));
    let (status, reply) = state
        .forms
        .lock()
        .unwrap()
        .get(&path)
        .cloned()
        .unwrap_or((200, json!({ "success": false })));
    (StatusCode::from_u16(status).unwrap(), Json(reply)).into_response()
}

async fn permissions(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    let auth = header_of(&headers, header::AUTHORIZATION);
    state.recorded.lock().unwrap().permission_auth.push(auth);
    let (status, reply) = state.permissions.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), Json(reply)).into_response()
}

impl FakeAuth {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            refresh: Mutex::new(RefreshReply::Status(401)),
            logout_status: Mutex::new(200),
            forms: Mutex::new(HashMap::new()),
            permissions: Mutex::new((200, json!({ "data": null }))),
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/auth/refresh-token", post(refresh))
            .route("/auth/logout", post(logout))
            .route("/auth/login", post(form))
            .route("/auth/signup", post(form))
            .route("/auth/google", post(form))
            .route("/auth/change-password", post(form))
            .route(
                "/user-permission/my-permission",
                axum::routing::get(permissions),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local address");
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: Url::parse(&format!("http://{}", addr)).expect("Invalid URL"),
            state,
            server_handle,
        }
    }

    pub fn reply_to_refresh(&self, reply: RefreshReply) {
        *self.state.refresh.lock().unwrap() = reply;
    }

    pub fn reply_to_logout(&self, status: u16) {
        *self.state.logout_status.lock().unwrap() = status;
    }

    /// Set the reply for a form endpoint such as `/auth/signup`.
    pub fn reply_to_form(&self, path: &str, status: u16, body: Value) {
        self.state
            .forms
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body));
    }

    pub fn reply_to_login(&self, status: u16, body: Value) {
        self.reply_to_form("/auth/login", status, body);
    }

    pub fn reply_to_permissions(&self, status: u16, body: Value) {
        *self.state.permissions.lock().unwrap() = (status, body);
    }

    pub fn refresh_calls(&self) -> Vec<Option<String>> {
        self.state.recorded.lock().unwrap().refresh_cookies.clone()
    }

    pub fn logout_calls(&self) -> Vec<Option<String>> {
        self.state.recorded.lock().unwrap().logout_cookies.clone()
    }

    /// Authorization header and body of every post to `path`.
    pub fn form_calls(&self, path: &str) -> Vec<(Option<String>, Value)> {
        self.state
            .recorded
            .lock()
            .unwrap()
            .forms
            .iter()
            .filter(|(p, _, _)| p == path)
            .map(|(_, auth, body)| (auth.clone(), body.clone()))
            .collect()
    }

    pub fn logins(&self) -> Vec<Value> {
        self.form_calls("/auth/login")
            .into_iter()
            .map(|(_, body)| body)
            .collect()
    }

    pub fn permission_calls(&self) -> Vec<Option<String>> {
        self.state.recorded.lock().unwrap().permission_auth.clone()
    }
}

pub fn config_for(api_host: &Url, environment: Environment) -> ServerConfig {
    ServerConfig {
        api_host: api_host.clone(),
        environment,
        jwt_secret: None,
        protected: Vec::new(),
        upstream_timeout: Some(Duration::from_secs(5)),
    }
}

/// Start a fake auth service and a development-mode app pointed at it.
pub async fn setup() -> (Router, FakeAuth) {
    let fake = FakeAuth::start().await;
    let app = create_app(&config_for(&fake.url, Environment::Development))
        .expect("Failed to create app");
    (app, fake)
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Unsigned three-segment session token expiring `exp_offset` seconds from now.
pub fn session_token(user_id: Option<&str>, exp_offset: i64) -> String {
    let payload = json!({
        "userId": user_id,
        "user_type": "b2b",
        "roleBaseUserId": "rb-100",
        "userUniqueId": "B2B-100",
        "email": "agent@example.com",
        "iat": now() - 60,
        "exp": now() + exp_offset,
    });
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    format!(
        "{}.{}.signature",
        header,
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
