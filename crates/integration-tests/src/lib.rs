//! Integration tests for nexdoor leads.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p nexdoor-integration-tests
//! ```
//!
//! No external services are needed. [`MockLeadService`] serves the lead
//! service's HTTP contract from an axum router on an ephemeral local port and
//! records every request it receives.
//!
//! # Test Categories
//!
//! - `store_http` - Wire contract of `HttpLeadStore`
//! - `leads_page` - End-to-end page flows over HTTP
//! - `concurrency` - Busy and in-flight rules against the in-memory store

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

/// Password the mock service accepts for every account.
pub const VALID_PASSWORD: &str = "hunter2";

/// Id the mock service assigns to the signed-in user.
pub const USER_ID: i64 = 42;

/// Endpoint of the lead service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Route {
    ListLeads,
    CreateLead,
    Upload,
    Login,
}

/// A canned response that replaces the default behaviour of a route.
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    content_type: &'static str,
    body: String,
}

impl Reply {
    /// JSON body with the given status.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    /// Plain text body with the given status.
    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: "text/plain",
            body: body.to_owned(),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

/// One multipart field as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub text: String,
}

/// A request the mock service received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: Route,
    pub query: BTreeMap<String, String>,
    pub json: Option<Value>,
    pub form: BTreeMap<String, FormField>,
}

#[derive(Debug, Default)]
struct ServiceState {
    leads: Mutex<Vec<Value>>,
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<BTreeMap<Route, Reply>>,
    next_id: Mutex<i64>,
}

type Shared = Arc<ServiceState>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Text form of an id-like JSON value.
fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl ServiceState {
    fn record(&self, request: RecordedRequest) {
        lock(&self.requests).push(request);
    }

    fn reply(&self, route: Route) -> Option<Reply> {
        lock(&self.replies).get(&route).cloned()
    }

    fn insert(&self, mut lead: Value, owner: &Value) {
        let mut next_id = lock(&self.next_id);
        *next_id += 1;
        if let Some(object) = lead.as_object_mut() {
            object.insert("id".to_string(), json!(*next_id));
            object.insert("idd".to_string(), owner.clone());
        }
        lock(&self.leads).push(lead);
    }
}

/// A running mock lead service.
#[derive(Debug, Clone)]
pub struct MockLeadService {
    addr: SocketAddr,
    state: Shared,
}

impl MockLeadService {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Shared::default();

        let app = Router::new()
            .route("/leads", get(list_leads).post(create_lead))
            .route("/upload", post(upload))
            .route("/login", post(login))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock lead service");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve mock lead service") });

        Self { addr, state }
    }

    /// Base URL to point a client at.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("mock service url")
    }

    /// Seed a lead record exactly as given.
    pub fn seed(&self, record: Value) {
        lock(&self.state.leads).push(record);
    }

    /// Answer every request on `route` with `reply` instead of the default.
    pub fn respond(&self, route: Route, reply: Reply) {
        lock(&self.state.replies).insert(route, reply);
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Requests received on one route.
    #[must_use]
    pub fn requests_to(&self, route: Route) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.route == route)
            .collect()
    }
}

async fn list_leads(
    State(state): State<Shared>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    let owner = query.get("idd").cloned();
    state.record(RecordedRequest {
        route: Route::ListLeads,
        query,
        json: None,
        form: BTreeMap::new(),
    });

    if let Some(reply) = state.reply(Route::ListLeads) {
        return reply.into_response();
    }

    let data: Vec<Value> = lock(&state.leads)
        .iter()
        .filter(|lead| {
            let lead_owner = lead.get("idd").map(id_text);
            owner.is_some() && lead_owner == owner
        })
        .cloned()
        .collect();

    Json(json!({ "data": data })).into_response()
}

async fn create_lead(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.record(RecordedRequest {
        route: Route::CreateLead,
        query: BTreeMap::new(),
        json: Some(body.clone()),
        form: BTreeMap::new(),
    });

    if let Some(reply) = state.reply(Route::CreateLead) {
        return reply.into_response();
    }

    let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
    if name.trim().is_empty() {
        return Json(json!({ "error": "Name is required" })).into_response();
    }

    let owner = body.get("idd").cloned().unwrap_or(Value::Null);
    state.insert(body, &owner);
    Json(json!({})).into_response()
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    let mut form = BTreeMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let text = field.text().await.unwrap_or_default();
        form.insert(
            name,
            FormField {
                file_name,
                content_type,
                text,
            },
        );
    }

    state.record(RecordedRequest {
        route: Route::Upload,
        query: BTreeMap::new(),
        json: None,
        form: form.clone(),
    });

    if let Some(reply) = state.reply(Route::Upload) {
        return reply.into_response();
    }

    let (Some(file), Some(user_id)) = (form.get("file"), form.get("user_id")) else {
        return Reply::json(400, &json!({ "error": "file and user_id are required" }))
            .into_response();
    };

    let owner = user_id
        .text
        .parse::<i64>()
        .map_or_else(|_| json!(user_id.text), |id| json!(id));

    // Naive CSV split; test files never quote commas
    let mut lines = file.text.lines();
    let header: Vec<&str> = lines.next().unwrap_or_default().split(',').collect();
    for line in lines.filter(|line| !line.trim().is_empty()) {
        let record: serde_json::Map<String, Value> = header
            .iter()
            .zip(line.split(','))
            .map(|(key, value)| ((*key).to_owned(), json!(value)))
            .collect();
        state.insert(Value::Object(record), &owner);
    }

    Json(json!({ "file": file.file_name })).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    state.record(RecordedRequest {
        route: Route::Login,
        query: BTreeMap::new(),
        json: Some(body.clone()),
        form: BTreeMap::new(),
    });

    if let Some(reply) = state.reply(Route::Login) {
        return reply.into_response();
    }

    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str);

    if password == Some(VALID_PASSWORD) {
        Json(json!({
            "success": true,
            "user": { "id": USER_ID, "email": email, "name": "Test Agent" }
        }))
        .into_response()
    } else {
        Json(json!({ "success": false })).into_response()
    }
}
