//! Upload flows against a local mock server
//!
//! The server stands in for an image host (raw PUT and multipart POST) and for
//! the GitHub contents API, and records what it received.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{post, put},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde_json::{Value, json};
use std::fs;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use hoist::adapter::AdapterDefinition;
use hoist::backends::{GithubSettings, GithubUploader};
use hoist::config::{Config, HttpSettings};
use hoist::http::HttpClient;
use hoist::observability::RunStats;
use hoist::options::RunOptions;
use hoist::orchestrator::upload_all;
use hoist::registry::{ExtensionCatalog, select_uploader};
use hoist::{TaskOutcome, TaskStatus, UploadError, Uploader};

const FILE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

#[derive(Debug, Clone)]
struct ReceivedPut {
    path: String,
    body: Bytes,
    authorization: Option<String>,
}

#[derive(Debug, Clone)]
struct ReceivedField {
    name: String,
    file_name: Option<String>,
    data: Bytes,
}

#[derive(Default)]
struct Received {
    puts: Vec<ReceivedPut>,
    fields: Vec<ReceivedField>,
    github: Vec<(String, Value)>,
}

type Shared = Arc<Mutex<Received>>;

async fn start_mock_server(state: Shared) -> String {
    let app = Router::new()
        .route("/raw/{*path}", put(put_raw))
        .route("/api/upload", post(post_multipart))
        .route("/repos/{user}/{repo}/contents/{*path}", put(github_contents))
        .with_state(state);

    // Bind to random available port
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", bound_addr)
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn put_raw(
    State(state): State<Shared>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.lock().unwrap().puts.push(ReceivedPut {
        path: path.clone(),
        body,
        authorization: authorization(&headers),
    });

    (
        StatusCode::CREATED,
        [(header::LOCATION, format!("https://files.example.com/{path}"))],
        "",
    )
}

async fn post_multipart(
    State(state): State<Shared>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut key = None;
    let mut image_name = None;

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.unwrap();

        match name.as_str() {
            "key" => key = Some(String::from_utf8_lossy(&data).into_owned()),
            "image" => image_name = file_name.clone(),
            _ => {}
        }

        state.lock().unwrap().fields.push(ReceivedField {
            name,
            file_name,
            data,
        });
    }

    if key.as_deref() != Some("k-123") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }

    (
        StatusCode::OK,
        Json(json!({
            "data": {"url": format!("https://img.example.com/{}", image_name.unwrap_or_default())}
        })),
    )
}

async fn github_contents(
    State(state): State<Shared>,
    Path((_user, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.lock().unwrap().github.push((path.clone(), body));

    if authorization(&headers).as_deref() != Some("token ghp_test") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Bad credentials"})),
        );
    }

    if path.ends_with("exists.png") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"message": "Invalid request.\n\n\"sha\" wasn't supplied."})),
        );
    }

    (StatusCode::CREATED, Json(json!({"content": {"path": path}})))
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn file(&self, name: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, FILE_BYTES).unwrap();
        path.to_string_lossy().into_owned()
    }
}

fn http() -> HttpClient {
    HttpClient::new(&HttpSettings::default()).unwrap()
}

fn catalog_with(definition: Value) -> ExtensionCatalog {
    let mut catalog = ExtensionCatalog::new();
    catalog.register(AdapterDefinition::parse(&definition.to_string()).unwrap());
    catalog
}

fn config_with(id: &str, settings: Value) -> Config {
    let mut config = Config::default();
    let settings = settings
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    config.uploaders.insert(id.to_string(), settings);
    config
}

fn recording_callback(uploader: &mut dyn Uploader) -> Arc<Mutex<Vec<(usize, TaskStatus)>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    uploader.set_callback(Box::new(move |outcome: &TaskOutcome| {
        let task = match outcome {
            Ok(task) => task,
            Err(failure) => &failure.task,
        };
        sink.lock().unwrap().push((task.id, task.status));
    }));
    seen
}

#[tokio::test]
async fn test_raw_put_with_header_extraction() {
    let state = Shared::default();
    let base = start_mock_server(state.clone()).await;
    let workspace = Workspace::new();

    let catalog = catalog_with(json!({
        "meta": {"id": "rawput", "type": "simple-http-uploader"},
        "http": {"request": {
            "method": "PUT",
            "url": format!("{base}/raw/$(task.target_path)"),
            "headers": {
                "Authorization": "Bearer $(ext_config.token)",
                "Content-Type": "application/octet-stream"
            }
        }},
        "upload": {"rawUrl": {"from": "response_header", "header": "Location"}}
    }));

    let mut config = config_with("rawput", json!({"token": "secret"}));
    config.replacements.insert(
        "https://files.example.com".to_string(),
        "https://cdn.example.com".to_string(),
    );

    let mut uploader = select_uploader(
        "rawput",
        Arc::new(config),
        Arc::new(RunOptions::default()),
        http(),
        &catalog,
    )
    .unwrap();
    let seen = recording_callback(uploader.as_mut());

    let inputs = vec![workspace.file("a.png"), "https://elsewhere.example.com/b.png".to_string()];
    let stats = RunStats::new();
    let outcomes = upload_all(uploader.as_ref(), &inputs, Some("/2024/"), &stats).await;

    let task = outcomes[0].as_ref().unwrap();
    assert_eq!(task.status, TaskStatus::Finished);
    assert_eq!(task.target_path, "2024/a.png");
    assert_eq!(task.raw_url, "https://files.example.com/2024/a.png");
    assert_eq!(task.url, "https://cdn.example.com/2024/a.png");

    let passed = outcomes[1].as_ref().unwrap();
    assert!(passed.ignored);
    assert_eq!(passed.url, "https://elsewhere.example.com/b.png");

    let received = state.lock().unwrap();
    assert_eq!(received.puts.len(), 1);
    assert_eq!(received.puts[0].path, "2024/a.png");
    assert_eq!(&received.puts[0].body[..], FILE_BYTES);
    assert_eq!(received.puts[0].authorization.as_deref(), Some("Bearer secret"));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(0, TaskStatus::Finished), (1, TaskStatus::Finished)]
    );
    assert_eq!(stats.snapshot().ignored, 1);
}

fn multipart_definition(base: &str) -> Value {
    json!({
        "meta": {"id": "imgbed", "type": "simple-http-uploader"},
        "http": {"request": {
            "method": "POST",
            "url": format!("{base}/api/upload"),
            "headers": {"Content-Type": "multipart/form-data"},
            "body": {
                "image": {"type": "file"},
                "key": {"type": "string", "value": "$(ext_config.api_key)"}
            }
        }},
        "upload": {"rawUrl": {"from": "json_response", "path": "data.url"}}
    })
}

#[tokio::test]
async fn test_multipart_with_json_response() {
    let state = Shared::default();
    let base = start_mock_server(state.clone()).await;
    let workspace = Workspace::new();

    let uploader = select_uploader(
        "imgbed",
        Arc::new(config_with("imgbed", json!({"api_key": "k-123"}))),
        Arc::new(RunOptions::default()),
        http(),
        &catalog_with(multipart_definition(&base)),
    )
    .unwrap();

    let outcomes = upload_all(
        uploader.as_ref(),
        &[workspace.file("a.png")],
        Some("img"),
        &RunStats::new(),
    )
    .await;

    let task = outcomes[0].as_ref().unwrap();
    assert_eq!(task.raw_url, "https://img.example.com/a.png");
    assert_eq!(task.url, task.raw_url);

    let received = state.lock().unwrap();
    let image = received.fields.iter().find(|f| f.name == "image").unwrap();
    assert_eq!(image.file_name.as_deref(), Some("a.png"));
    assert_eq!(&image.data[..], FILE_BYTES);

    let key = received.fields.iter().find(|f| f.name == "key").unwrap();
    assert_eq!(&key.data[..], b"k-123");
}

#[tokio::test]
async fn test_error_status_fails_task_and_batch_continues() {
    let state = Shared::default();
    let base = start_mock_server(state.clone()).await;
    let workspace = Workspace::new();

    let mut uploader = select_uploader(
        "imgbed",
        Arc::new(config_with("imgbed", json!({"api_key": "wrong"}))),
        Arc::new(RunOptions::default()),
        http(),
        &catalog_with(multipart_definition(&base)),
    )
    .unwrap();
    let seen = recording_callback(uploader.as_mut());

    let stats = RunStats::new();
    let outcomes = upload_all(
        uploader.as_ref(),
        &[workspace.file("a.png"), workspace.file("b.png")],
        None,
        &stats,
    )
    .await;

    for outcome in &outcomes {
        let failure = outcome.as_ref().unwrap_err();
        assert_eq!(failure.task.status, TaskStatus::Failed);
        assert!(failure.task.url.is_empty());
        assert!(matches!(failure.error, UploadError::Status { status: 401, .. }));
        assert!(failure.error.to_string().contains("bad key"));
    }

    // Both files reached the server
    let images = state
        .lock()
        .unwrap()
        .fields
        .iter()
        .filter(|f| f.name == "image")
        .count();
    assert_eq!(images, 2);

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(0, TaskStatus::Failed), (1, TaskStatus::Failed)]
    );
    assert_eq!(stats.snapshot().failed, 2);
}

fn github_uploader(base: &str, pat: &str) -> GithubUploader {
    let settings = GithubSettings {
        username: "octo".to_string(),
        repo: "pics".to_string(),
        branch: "master".to_string(),
        pat: pat.to_string(),
    };
    GithubUploader::new(settings, Arc::new(Config::default()), http()).with_api_base(base)
}

#[tokio::test]
async fn test_github_contents_upload() {
    let state = Shared::default();
    let base = start_mock_server(state.clone()).await;
    let workspace = Workspace::new();

    let uploader = github_uploader(&base, "ghp_test");
    let outcomes = upload_all(
        &uploader,
        &[workspace.file("a.png"), workspace.file("exists.png")],
        Some("img"),
        &RunStats::new(),
    )
    .await;

    let task = outcomes[0].as_ref().unwrap();
    assert_eq!(
        task.raw_url,
        "https://raw.githubusercontent.com/octo/pics/master/img/a.png"
    );

    // An existing file still yields its URL
    let existing = outcomes[1].as_ref().unwrap();
    assert!(existing.raw_url.ends_with("/img/exists.png"));

    let received = state.lock().unwrap();
    let (path, body) = &received.github[0];
    assert_eq!(path, "img/a.png");
    assert_eq!(body["branch"], "master");
    assert!(body["message"].as_str().unwrap().contains("a.png"));
    assert_eq!(
        BASE64.decode(body["content"].as_str().unwrap()).unwrap(),
        FILE_BYTES
    );
}

#[tokio::test]
async fn test_github_bad_token() {
    let state = Shared::default();
    let base = start_mock_server(state.clone()).await;
    let workspace = Workspace::new();

    let uploader = github_uploader(&base, "wrong");
    let outcomes = upload_all(&uploader, &[workspace.file("a.png")], None, &RunStats::new()).await;

    let failure = outcomes[0].as_ref().unwrap_err();
    assert!(matches!(failure.error, UploadError::Status { status: 401, .. }));
    assert!(failure.error.to_string().contains("Bad credentials"));
}
