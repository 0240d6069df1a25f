//! In-process mock of the remote content store: versioned resources with
//! optimistic-concurrency puts, an action-dispatch endpoint, and a latest-run
//! endpoint.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use reportctl::model::Session;

pub const TOKEN: &str = "test-token";

#[derive(Clone)]
pub struct Resource {
    /// Base64 text, exactly as uploaded.
    pub content: String,
    pub version: String,
}

#[derive(Default)]
pub struct StoreState {
    pub resources: HashMap<String, Resource>,
    pub next_rev: u64,
    pub dispatches: Vec<(String, serde_json::Value)>,
    pub latest_run: Option<serde_json::Value>,
}

type Shared = Arc<Mutex<StoreState>>;

pub struct MockStore {
    pub base_url: String,
    pub state: Shared,
}

impl MockStore {
    pub fn session(&self, token: &str) -> Session {
        Session {
            base_url: self.base_url.clone(),
            repo: "reports".to_string(),
            token: token.to_string(),
        }
    }

    /// Decoded JSON body of a stored resource, for asserting what the store
    /// actually holds.
    pub fn resource_json(&self, path: &str) -> Option<serde_json::Value> {
        let state = self.state.lock().unwrap();
        let res = state.resources.get(path)?;
        let bytes = BASE64.decode(res.content.as_bytes()).unwrap();
        Some(serde_json::from_slice(&bytes).unwrap())
    }

    pub fn set_latest_run(&self, run: serde_json::Value) {
        self.state.lock().unwrap().latest_run = Some(run);
    }

    pub fn dispatches(&self) -> Vec<(String, serde_json::Value)> {
        self.state.lock().unwrap().dispatches.clone()
    }
}

pub fn spawn() -> MockStore {
    let state: Shared = Arc::new(Mutex::new(StoreState {
        next_rev: 1,
        ..Default::default()
    }));
    let app_state = state.clone();
    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app(app_state)).await.unwrap();
        });
    });

    let addr = rx.recv().unwrap();
    MockStore {
        base_url: format!("http://{}", addr),
        state,
    }
}

fn app(state: Shared) -> Router {
    Router::new()
        .route(
            "/repos/:repo/resource/:path",
            get(get_resource).put(put_resource),
        )
        .route("/repos/:repo/actions/:action/dispatch", post(dispatch))
        .route("/repos/:repo/runs", get(runs))
        .with_state(state)
}

fn authed(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {}", TOKEN);
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "bad credentials"})),
    )
        .into_response()
}

async fn get_resource(
    State(state): State<Shared>,
    Path((_repo, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    match state.resources.get(&path) {
        Some(res) => Json(json!({"content": res.content, "version": res.version})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response(),
    }
}

#[derive(serde::Deserialize)]
struct PutBody {
    #[allow(dead_code)]
    message: String,
    content: String,
    #[serde(default)]
    version: Option<String>,
}

async fn put_resource(
    State(state): State<Shared>,
    Path((_repo, path)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<PutBody>,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    let current = state.resources.get(&path).map(|r| r.version.clone());
    match (&current, &body.version) {
        (None, None) => {}
        (Some(cur), Some(v)) if cur == v => {}
        _ => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"message": "version mismatch"})),
            )
                .into_response();
        }
    }
    let version = format!("v{}", state.next_rev);
    state.next_rev += 1;
    state.resources.insert(
        path,
        Resource {
            content: body.content,
            version: version.clone(),
        },
    );
    Json(json!({"content": {"version": version}})).into_response()
}

async fn dispatch(
    State(state): State<Shared>,
    Path((_repo, action)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    state.lock().unwrap().dispatches.push((action, body));
    StatusCode::NO_CONTENT.into_response()
}

async fn runs(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    match &state.lock().unwrap().latest_run {
        Some(run) => Json(run.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "no runs"}))).into_response(),
    }
}
