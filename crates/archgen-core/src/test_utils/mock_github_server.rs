// src/test_utils/mock_github_server.rs
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{routing::get, Json, Router};
use base64::Engine;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    sha: String,
}

#[derive(Clone, Default)]
struct MockGitHubState {
    files: Arc<Mutex<HashMap<String, StoredFile>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    lookup_status: Arc<Mutex<Option<StatusCode>>>,
    write_status: Arc<Mutex<Option<StatusCode>>>,
    commits: Arc<Mutex<u32>>,
}

fn file_key(owner: &str, repo: &str, path: &str) -> String {
    format!("{}/{}/{}", owner, repo, path)
}

fn blob_sha(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

async fn get_contents(
    State(state): State<MockGitHubState>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    log::debug!("Mock GitHub server GET {}/{}/{}", owner, repo, path);
    state.requests.lock().unwrap().push(RecordedRequest {
        method: "GET".to_string(),
        path: path.clone(),
        query,
        authorization: authorization(&headers),
        body: None,
    });

    if let Some(status) = *state.lookup_status.lock().unwrap() {
        return (status, Json(json!({"message": "Forced lookup failure"})));
    }

    match state.files.lock().unwrap().get(&file_key(&owner, &repo, &path)) {
        Some(file) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(file.content.as_bytes());
            (
                StatusCode::OK,
                Json(json!({
                    "type": "file",
                    "path": path,
                    "sha": file.sha,
                    "content": encoded,
                    "encoding": "base64"
                })),
            )
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))),
    }
}

async fn put_contents(
    State(state): State<MockGitHubState>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    log::debug!("Mock GitHub server PUT {}/{}/{}", owner, repo, path);
    state.requests.lock().unwrap().push(RecordedRequest {
        method: "PUT".to_string(),
        path: path.clone(),
        query: None,
        authorization: authorization(&headers),
        body: Some(body.clone()),
    });

    if let Some(status) = *state.write_status.lock().unwrap() {
        return (status, Json(json!({"message": "Forced write failure"})));
    }

    let content = match body
        .get("content")
        .and_then(Value::as_str)
        .and_then(|c| base64::engine::general_purpose::STANDARD.decode(c).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
    {
        Some(content) => content,
        None => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"message": "content is not valid Base64"})),
            )
        }
    };

    let key = file_key(&owner, &repo, &path);
    let mut files = state.files.lock().unwrap();
    let sent_sha = body.get("sha").and_then(Value::as_str);
    let created = match (files.get(&key), sent_sha) {
        (Some(_), None) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"message": "Invalid request.\n\n\"sha\" wasn't supplied."})),
            )
        }
        (Some(existing), Some(sha)) if existing.sha != sha => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"message": format!("{} does not match {}", path, sha)})),
            )
        }
        (Some(_), Some(_)) => false,
        (None, _) => true,
    };

    let sha = blob_sha(&content);
    files.insert(key, StoredFile { content, sha: sha.clone() });

    let mut commits = state.commits.lock().unwrap();
    *commits += 1;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    (
        status,
        Json(json!({
            "content": {"path": path, "sha": sha},
            "commit": {"sha": format!("commit-{}", *commits)}
        })),
    )
}

/// In-process stand-in for the GitHub contents API.
pub struct MockGitHubServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    state: MockGitHubState,
}

impl MockGitHubServer {
    pub async fn start() -> Self {
        let state = MockGitHubState::default();

        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/contents/{*path}",
                get(get_contents).put(put_contents),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock GitHub server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock GitHub server error: {}", e);
                });
        });

        MockGitHubServer {
            addr,
            shutdown_tx,
            state,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Pre-populate a file; returns its blob sha.
    pub fn seed_file(&self, owner: &str, repo: &str, path: &str, content: &str) -> String {
        let sha = blob_sha(content);
        self.state.files.lock().unwrap().insert(
            file_key(owner, repo, path),
            StoredFile {
                content: content.to_string(),
                sha: sha.clone(),
            },
        );
        sha
    }

    pub fn file_content(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        self.state
            .files
            .lock()
            .unwrap()
            .get(&file_key(owner, repo, path))
            .map(|f| f.content.clone())
    }

    pub fn fail_lookups_with(&self, status: StatusCode) {
        *self.state.lookup_status.lock().unwrap() = Some(status);
    }

    pub fn fail_writes_with(&self, status: StatusCode) {
        *self.state.write_status.lock().unwrap() = Some(status);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock GitHub server shutdown signal already sent or receiver dropped.");
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }
}
