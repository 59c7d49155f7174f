//! In-memory stand-in for the hosting platform's schedule, websites and
//! domains APIs. Every call is recorded so tests can count requests per path.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Hourly,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub user: String,
    pub command: String,
    pub enabled: bool,
    pub interval: Interval,
    pub hour: Option<u8>,
    pub minute: u8,
    pub logfile: String,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub command: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub interval: Interval,
    pub hour: Option<u8>,
    pub minute: u8,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub command: Option<String>,
    pub enabled: Option<bool>,
    pub interval: Option<Interval>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Webapp {
    pub id: u64,
    pub command: String,
    pub domains: Vec<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Website {
    pub id: u64,
    pub user: String,
    pub domain_name: String,
    pub enabled: bool,
    pub webapp: Webapp,
    pub logfiles: BTreeMap<String, String>,
}

#[derive(Deserialize)]
pub struct CreateWebsite {
    pub domain_name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub webapp: CreateWebapp,
}

#[derive(Deserialize)]
pub struct CreateWebapp {
    pub command: String,
}

#[derive(Deserialize)]
pub struct CreateCertificate {
    pub cert_type: String,
}

fn enabled_by_default() -> bool {
    true
}

/// One request seen by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
}

#[derive(Default)]
struct Db {
    next_id: u64,
    tasks: BTreeMap<u64, Task>,
    websites: BTreeMap<String, Website>,
    certificates: HashMap<String, Value>,
}

impl Db {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared server state. Cloning shares the same data and call log.
#[derive(Clone, Default)]
pub struct MockState {
    db: Arc<RwLock<Db>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    token: Option<String>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept `Authorization: Token {token}`. Without this any
    /// non-empty token is accepted.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Number of recorded calls with this method and path.
    pub fn call_count(&self, method: &str, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    fn authorized(&self, header: Option<&str>) -> bool {
        let Some(token) = header.and_then(|value| value.strip_prefix("Token ")) else {
            return false;
        };
        match &self.token {
            Some(expected) => token == expected,
            None => !token.trim().is_empty(),
        }
    }
}

pub fn app() -> Router {
    app_with_state(MockState::new())
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route(
            "/api/v0/user/{username}/schedule/",
            get(list_tasks).post(create_task),
        )
        .route(
            "/api/v0/user/{username}/schedule/{id}/",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route(
            "/api/v0/user/{username}/websites/",
            get(list_websites).post(create_website),
        )
        .route(
            "/api/v0/user/{username}/websites/{domain}/",
            get(get_website).delete(delete_website),
        )
        .route(
            "/api/v0/user/{username}/websites/{domain}/reload/",
            post(reload_website),
        )
        .route(
            "/api/v0/user/{username}/domains/{domain}/ssl/",
            get(get_certificate).post(create_certificate),
        )
        .layer(middleware::from_fn_with_state(state.clone(), record_and_authorize))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, MockState::new()).await
}

pub async fn serve(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn record_and_authorize(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let call = RecordedCall {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
    };
    debug!(method = %call.method, path = %call.path, "mock API call");
    if let Ok(mut calls) = state.calls.lock() {
        calls.push(call);
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if !state.authorized(header) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided."})),
        )
            .into_response();
    }
    next.run(request).await
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
}

fn field_error(field: &str, message: &str) -> Response {
    let mut errors = Map::new();
    errors.insert(field.to_string(), json!([message]));
    (StatusCode::BAD_REQUEST, Json(Value::Object(errors))).into_response()
}

/// Check interval/hour/minute consistency, normalising `hour` for hourly tasks.
fn validate_timing(interval: Interval, hour: Option<u8>, minute: u8) -> Result<Option<u8>, Response> {
    if minute > 59 {
        return Err(field_error("minute", "Ensure this value is less than or equal to 59."));
    }
    match (interval, hour) {
        (Interval::Daily, None) => Err(field_error("hour", "This field is required for daily tasks.")),
        (Interval::Daily, Some(h)) if h > 23 => {
            Err(field_error("hour", "Ensure this value is less than or equal to 23."))
        }
        (Interval::Daily, Some(h)) => Ok(Some(h)),
        (Interval::Hourly, _) => Ok(None),
    }
}

async fn list_tasks(State(state): State<MockState>, Path(username): Path<String>) -> Json<Vec<Task>> {
    let db = state.db.read().await;
    Json(
        db.tasks
            .values()
            .filter(|task| task.user == username)
            .cloned()
            .collect(),
    )
}

async fn create_task(
    State(state): State<MockState>,
    Path(username): Path<String>,
    Json(input): Json<CreateTask>,
) -> Response {
    let hour = match validate_timing(input.interval, input.hour, input.minute) {
        Ok(hour) => hour,
        Err(response) => return response,
    };
    let mut db = state.db.write().await;
    let id = db.allocate_id();
    let task = Task {
        id,
        logfile: format!("/var/log/tasks/{username}/task-{id}.log"),
        user: username,
        command: input.command,
        enabled: input.enabled,
        interval: input.interval,
        hour,
        minute: input.minute,
    };
    db.tasks.insert(id, task.clone());
    (StatusCode::CREATED, Json(task)).into_response()
}

async fn get_task(State(state): State<MockState>, Path((username, id)): Path<(String, u64)>) -> Response {
    let db = state.db.read().await;
    match db.tasks.get(&id).filter(|task| task.user == username) {
        Some(task) => Json(task.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_task(
    State(state): State<MockState>,
    Path((username, id)): Path<(String, u64)>,
    Json(input): Json<UpdateTask>,
) -> Response {
    let mut db = state.db.write().await;
    let Some(task) = db.tasks.get_mut(&id).filter(|task| task.user == username) else {
        return not_found();
    };

    let interval = input.interval.unwrap_or(task.interval);
    let hour = input.hour.or(task.hour);
    let minute = input.minute.unwrap_or(task.minute);
    let hour = match validate_timing(interval, hour, minute) {
        Ok(hour) => hour,
        Err(response) => return response,
    };

    if let Some(command) = input.command {
        task.command = command;
    }
    if let Some(enabled) = input.enabled {
        task.enabled = enabled;
    }
    task.interval = interval;
    task.hour = hour;
    task.minute = minute;
    Json(task.clone()).into_response()
}

async fn delete_task(State(state): State<MockState>, Path((username, id)): Path<(String, u64)>) -> Response {
    let mut db = state.db.write().await;
    if db.tasks.get(&id).is_some_and(|task| task.user == username) {
        db.tasks.remove(&id);
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found()
    }
}

async fn list_websites(State(state): State<MockState>, Path(username): Path<String>) -> Json<Vec<Website>> {
    let db = state.db.read().await;
    Json(
        db.websites
            .values()
            .filter(|site| site.user == username)
            .cloned()
            .collect(),
    )
}

/// Creates a website, replacing the webapp of an existing one for the same
/// domain.
async fn create_website(
    State(state): State<MockState>,
    Path(username): Path<String>,
    Json(input): Json<CreateWebsite>,
) -> Response {
    if input.domain_name.trim().is_empty() {
        return field_error("domain_name", "This field may not be blank.");
    }
    let mut db = state.db.write().await;
    let existing = db.websites.get(&input.domain_name).map(|site| site.id);
    let id = match existing {
        Some(id) => id,
        None => db.allocate_id(),
    };
    let domain = input.domain_name;
    let website = Website {
        id,
        user: username,
        enabled: input.enabled,
        webapp: Webapp {
            id,
            command: input.webapp.command,
            domains: vec![json!({"domain_name": domain, "enabled": input.enabled})],
        },
        logfiles: ["access", "error", "server"]
            .iter()
            .map(|kind| (kind.to_string(), format!("/var/log/{domain}.{kind}.log")))
            .collect(),
        domain_name: domain.clone(),
    };
    db.websites.insert(domain, website.clone());
    (StatusCode::CREATED, Json(website)).into_response()
}

async fn get_website(
    State(state): State<MockState>,
    Path((username, domain)): Path<(String, String)>,
) -> Response {
    let db = state.db.read().await;
    match db.websites.get(&domain).filter(|site| site.user == username) {
        Some(site) => Json(site.clone()).into_response(),
        None => not_found(),
    }
}

async fn delete_website(
    State(state): State<MockState>,
    Path((username, domain)): Path<(String, String)>,
) -> Response {
    let mut db = state.db.write().await;
    if db.websites.get(&domain).is_some_and(|site| site.user == username) {
        db.websites.remove(&domain);
        db.certificates.remove(&domain);
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found()
    }
}

async fn reload_website(
    State(state): State<MockState>,
    Path((username, domain)): Path<(String, String)>,
) -> Response {
    let db = state.db.read().await;
    if db.websites.get(&domain).is_some_and(|site| site.user == username) {
        Json(json!({"status": "OK"})).into_response()
    } else {
        not_found()
    }
}

async fn get_certificate(
    State(state): State<MockState>,
    Path((username, domain)): Path<(String, String)>,
) -> Response {
    let db = state.db.read().await;
    if !db.websites.get(&domain).is_some_and(|site| site.user == username) {
        return not_found();
    }
    match db.certificates.get(&domain) {
        Some(cert) => Json(cert.clone()).into_response(),
        None => not_found(),
    }
}

async fn create_certificate(
    State(state): State<MockState>,
    Path((username, domain)): Path<(String, String)>,
    Json(input): Json<CreateCertificate>,
) -> Response {
    if input.cert_type != "letsencrypt-auto-renew" {
        return field_error("cert_type", "Unsupported certificate type.");
    }
    let mut db = state.db.write().await;
    if !db.websites.get(&domain).is_some_and(|site| site.user == username) {
        return not_found();
    }
    let mut cert = Map::new();
    cert.insert("cert_type".into(), json!("letsencrypt"));
    cert.insert("is_auto_renewing".into(), json!(true));
    cert.insert("domains".into(), json!([domain]));
    db.certificates.insert(domain, Value::Object(cert));
    Json(json!({"status": "OK"})).into_response()
}
