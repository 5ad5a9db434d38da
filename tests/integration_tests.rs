use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use eduvid_client::api::{ApiClient, ClientError};
use eduvid_client::config::{Config, ConfigBuilder};
use eduvid_client::credentials::{CredentialStore, Credentials};
use eduvid_client::submit::Submitter;
use eduvid_client::sync::{GenerationStatus, ProjectWatch, PushChannel};
use eduvid_core::ContentSubmission;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

const LESSON: &str = "Photosynthesis is the process by which green plants turn light, water and carbon dioxide into sugar.";

#[derive(Debug, Clone)]
struct UploadedPart {
    name: String,
    file_name: String,
    content_type: String,
    len: usize,
}

/// In-process stand-in for the generation backend
#[derive(Clone, Default)]
struct MockBackend {
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    uploads: Arc<AtomicUsize>,
    upload_delay: Duration,
    files: Arc<Mutex<Vec<UploadedPart>>>,
    task_id: Option<String>,
    generate_calls: Arc<AtomicUsize>,
    /// Task status answers in order; the last one repeats
    statuses: Arc<Vec<Value>>,
    status_calls: Arc<AtomicUsize>,
    /// Text frames sent to every socket right after the upgrade
    frames: Arc<Vec<String>>,
    ws_connections: Arc<AtomicUsize>,
    ws_closed_by_client: Arc<AtomicBool>,
    /// Hold socket frames back until a generate request arrives
    frames_after_generate: bool,
    generate_requested: Arc<Notify>,
}

impl MockBackend {
    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().unwrap().push(value);
    }
}

async fn upload(State(backend): State<MockBackend>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    backend.record_auth(&headers);
    backend.uploads.fetch_add(1, Ordering::SeqCst);
    assert!(body.get("config").is_some());
    tokio::time::sleep(backend.upload_delay).await;
    Json(json!({ "project_id": 1, "message": "Content uploaded successfully", "status": "created" }))
}

async fn upload_file(State(backend): State<MockBackend>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let len = field.bytes().await.unwrap().len();
        backend.files.lock().unwrap().push(UploadedPart {
            name,
            file_name,
            content_type,
            len,
        });
    }
    Json(json!({ "project_id": 2, "message": "File uploaded successfully" }))
}

async fn list_projects(State(backend): State<MockBackend>, headers: HeaderMap) -> Json<Value> {
    backend.record_auth(&headers);
    Json(json!([
        { "id": 1, "title": "Photosynthesis", "status": "completed", "created_at": "2024-05-01T10:00:00" },
        { "id": 2, "title": "Fractions", "status": "created" }
    ]))
}

async fn get_project(Path(id): Path<u64>) -> Response {
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Project not found" }))).into_response();
    }
    Json(json!({ "id": id, "title": "Photosynthesis", "status": "processing" })).into_response()
}

async fn delete_project(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({ "message": format!("Project {} deleted", id) }))
}

async fn generate(State(backend): State<MockBackend>, Path(id): Path<u64>) -> Json<Value> {
    backend.generate_calls.fetch_add(1, Ordering::SeqCst);
    backend.generate_requested.notify_one();
    Json(json!({
        "message": "Video generation started",
        "task_id": backend.task_id,
        "project_id": id,
        "websocket_url": format!("/ws/{}", id)
    }))
}

async fn task_status(State(backend): State<MockBackend>, Path(task_id): Path<String>) -> Json<Value> {
    let call = backend.status_calls.fetch_add(1, Ordering::SeqCst);
    let mut status = match backend.statuses.len() {
        0 => json!({ "status": "PENDING" }),
        n => backend.statuses[call.min(n - 1)].clone(),
    };
    status["task_id"] = json!(task_id);
    Json(status)
}

async fn progress_socket(
    ws: WebSocketUpgrade,
    State(backend): State<MockBackend>,
    Path(_client_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_frames(socket, backend))
}

async fn stream_frames(mut socket: WebSocket, backend: MockBackend) {
    backend.ws_connections.fetch_add(1, Ordering::SeqCst);
    if backend.frames_after_generate {
        backend.generate_requested.notified().await;
    }
    for frame in backend.frames.iter() {
        if socket.send(Message::Text(frame.clone())).await.is_err() {
            return;
        }
    }
    while let Some(message) = socket.recv().await {
        match message {
            Ok(Message::Close(_)) => {
                backend.ws_closed_by_client.store(true, Ordering::SeqCst);
                break;
            }
            Err(_) => break,
            _ => {}
        }
    }
}

/// Serve the mock on an ephemeral port and return a matching client config
async fn spawn_backend(backend: MockBackend) -> Config {
    let app = Router::new()
        .route("/api/v1/content/upload", post(upload))
        .route("/api/v1/content/upload-file", post(upload_file))
        .route("/api/v1/content/projects", get(list_projects))
        .route("/api/v1/content/projects/:id", get(get_project).delete(delete_project))
        .route("/api/v1/video/generate/:id", post(generate))
        .route("/api/v1/status/task/:task_id", get(task_status))
        .route("/ws/:client_id", get(progress_socket))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ConfigBuilder::new()
        .with_base_url(format!("http://{}", addr))
        .with_ws_base_url(format!("ws://{}", addr))
        .with_poll_interval(Duration::from_millis(50))
        .build()
}

fn frame(progress: f64, status: &str, message: &str) -> String {
    json!({
        "progress": progress,
        "status": status,
        "message": message,
        "timestamp": "2024-05-01 10:00:00.000000"
    })
    .to_string()
}

async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

#[tokio::test]
async fn test_bearer_header_follows_stored_token() {
    let backend = MockBackend::default();
    let config = spawn_backend(backend.clone()).await;

    let dir = TempDir::new().unwrap();
    let store = CredentialStore::new(dir.path().join("credentials.json"), "access_token");

    let anonymous = ApiClient::new(&config.api, assert_ok!(store.load())).unwrap();
    assert_ok!(anonymous.content().projects().await);

    store.save("secret-token").unwrap();
    let authenticated = ApiClient::new(&config.api, store.load().unwrap()).unwrap();
    let projects = authenticated.content().projects().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert!(projects[0].created_at.is_some());

    let headers = backend.auth_headers.lock().unwrap().clone();
    assert_eq!(headers, vec![None, Some("Bearer secret-token".to_string())]);
}

#[tokio::test]
async fn test_backend_detail_is_surfaced() {
    let config = spawn_backend(MockBackend::default()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();

    let err = assert_err!(client.content().project(404).await);
    match err {
        ClientError::Http { status, message } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "Project not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let project = client.content().project(5).await.unwrap();
    assert_eq!(project.id, 5);
    assert_ok!(client.content().delete_project(5).await);
}

#[tokio::test]
async fn test_short_content_never_reaches_backend() {
    let backend = MockBackend::default();
    let config = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let submitter = Submitter::new(client.content().clone());

    let err = assert_err!(submitter.submit(&ContentSubmission::new("Fractions", "Too short")).await);
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(backend.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_one_upload_per_submit() {
    let backend = MockBackend {
        upload_delay: Duration::from_millis(200),
        ..MockBackend::default()
    };
    let config = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let submitter = Submitter::new(client.content().clone());

    let submission = ContentSubmission::new("Photosynthesis", LESSON).with_config(config.generation.clone());
    let (first, second) = tokio::join!(submitter.submit(&submission), submitter.submit(&submission));

    assert_eq!(first.unwrap().project_id, 1);
    assert!(matches!(second, Err(ClientError::Busy)));
    assert_eq!(backend.uploads.load(Ordering::SeqCst), 1);

    // permit released once the request finished
    assert_ok!(submitter.submit(&submission).await);
    assert_eq!(backend.uploads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_file_upload_is_single_multipart_part() {
    let backend = MockBackend::default();
    let config = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lesson.txt");
    tokio::fs::write(&path, LESSON).await.unwrap();

    let response = client.content().upload_file(&path).await.unwrap();
    assert_eq!(response.project_id, 2);

    let files = backend.files.lock().unwrap().clone();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "file");
    assert_eq!(files[0].file_name, "lesson.txt");
    assert_eq!(files[0].content_type, "text/plain");
    assert_eq!(files[0].len, LESSON.len());

    let exe = dir.path().join("setup.exe");
    tokio::fs::write(&exe, b"MZ").await.unwrap();
    let err = assert_err!(client.content().upload_file(&exe).await);
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(backend.files.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generation_polls_until_success() {
    let backend = MockBackend {
        task_id: Some("task-1".to_string()),
        statuses: Arc::new(vec![
            json!({ "status": "PROGRESS", "progress": { "percent": 40.0 } }),
            json!({ "status": "PROGRESS", "progress": { "percent": 70.0 } }),
            json!({ "status": "SUCCESS", "result": { "video_url": "https://cdn.example.org/v1.mp4" } }),
        ]),
        ..MockBackend::default()
    };
    let mut config = spawn_backend(backend.clone()).await;
    config.sync.enable_push = false;

    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let watch = ProjectWatch::open(1, client.video_handle(), None, &config.sync);
    let mut updates = watch.subscribe();
    assert_eq!(watch.view().status, GenerationStatus::Idle);

    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while updates.changed().await.is_ok() {
            let view = updates.borrow_and_update().clone();
            seen.push((view.status, view.percent));
            if view.status.is_terminal() {
                break;
            }
        }
        seen
    });

    let response = watch.generate().await.unwrap();
    assert_eq!(response.task_id.as_deref(), Some("task-1"));

    let view = tokio::time::timeout(Duration::from_secs(5), watch.wait_for_terminal())
        .await
        .unwrap();
    assert_eq!(view.status, GenerationStatus::Completed);
    assert_eq!(view.percent, 100.0);
    assert_eq!(view.video_url.as_deref(), Some("https://cdn.example.org/v1.mp4"));

    let seen = observer.await.unwrap();
    let percents: Vec<f64> = seen.iter().map(|(_, p)| *p).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert!(seen.iter().any(|(s, p)| *s == GenerationStatus::Generating && *p == 70.0));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
    assert!(!watch.is_polling());
}

#[tokio::test]
async fn test_generation_failure_stops_polling() {
    let backend = MockBackend {
        task_id: Some("task-2".to_string()),
        statuses: Arc::new(vec![json!({ "status": "FAILURE", "error": "boom" })]),
        ..MockBackend::default()
    };
    let mut config = spawn_backend(backend.clone()).await;
    config.sync.enable_push = false;

    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let watch = ProjectWatch::open(1, client.video_handle(), None, &config.sync);
    watch.generate().await.unwrap();

    let view = tokio::time::timeout(Duration::from_secs(5), watch.wait_for_terminal())
        .await
        .unwrap();
    assert_eq!(view.status, GenerationStatus::Failed);
    assert_eq!(view.error.as_deref(), Some("boom"));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_teardown_stops_polling_and_closes_socket() {
    let backend = MockBackend {
        task_id: Some("task-3".to_string()),
        statuses: Arc::new(vec![json!({ "status": "PROGRESS", "progress": { "percent": 10.0 } })]),
        ..MockBackend::default()
    };
    let config = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let push = PushChannel::new(&config.api.ws_base_url);

    let watch = ProjectWatch::open(1, client.video_handle(), Some(&push), &config.sync);
    assert!(eventually(|| backend.ws_connections.load(Ordering::SeqCst) == 1).await);
    assert!(eventually(|| watch.view().connected).await);

    watch.generate().await.unwrap();
    assert!(eventually(|| backend.status_calls.load(Ordering::SeqCst) >= 2).await);

    watch.close().await;
    let calls = backend.status_calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), calls);
    assert!(eventually(|| backend.ws_closed_by_client.load(Ordering::SeqCst)).await);
}

#[tokio::test]
async fn test_push_frames_never_regress() {
    let backend = MockBackend {
        frames: Arc::new(vec![
            frame(10.0, "analyzing", "Reading the lesson"),
            frame(35.0, "generating_script", "Writing the script"),
            frame(20.0, "generating_script", "Late frame"),
            "{not json".to_string(),
            frame(35.0, "generating_script", "Still writing"),
        ]),
        ..MockBackend::default()
    };
    let mut config = spawn_backend(backend.clone()).await;
    config.sync.enable_poll = false;

    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let push = PushChannel::new(&config.api.ws_base_url);
    let watch = ProjectWatch::open(9, client.video_handle(), Some(&push), &config.sync);

    assert!(eventually(|| watch.view().message == "Still writing").await);
    let view = watch.view();
    assert_eq!(view.percent, 35.0);
    assert_eq!(view.stage, "generating_script");
    assert_eq!(view.status, GenerationStatus::Generating);
    assert!(view.connected);
}

#[tokio::test]
async fn test_completed_frame_ends_attempt_without_task_id() {
    let backend = MockBackend {
        frames: Arc::new(vec![
            frame(50.0, "creating_visuals", "Drawing"),
            frame(100.0, "completed", "Video ready"),
        ]),
        ..MockBackend::default()
    };
    let config = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let push = PushChannel::new(&config.api.ws_base_url);
    let watch = ProjectWatch::open(4, client.video_handle(), Some(&push), &config.sync);

    let view = tokio::time::timeout(Duration::from_secs(5), watch.wait_for_terminal())
        .await
        .unwrap();
    assert_eq!(view.status, GenerationStatus::Completed);
    assert_eq!(view.percent, 100.0);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_frame_ends_attempt_without_task_id() {
    let backend = MockBackend {
        frames: Arc::new(vec![
            frame(45.0, "creating_visuals", "Drawing"),
            frame(0.0, "failed", "Generation failed: boom"),
        ]),
        frames_after_generate: true,
        ..MockBackend::default()
    };
    let config = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let push = PushChannel::new(&config.api.ws_base_url);
    let watch = ProjectWatch::open(5, client.video_handle(), Some(&push), &config.sync);
    assert!(eventually(|| watch.view().connected).await);

    let response = watch.generate().await.unwrap();
    assert!(response.task_id.is_none());

    let view = tokio::time::timeout(Duration::from_secs(5), watch.wait_for_terminal())
        .await
        .unwrap();
    assert_eq!(view.status, GenerationStatus::Failed);
    assert_eq!(view.error.as_deref(), Some("Generation failed: boom"));
    assert_eq!(view.percent, 45.0);
    assert_eq!(view.attempt, 1);
    assert_eq!(backend.status_calls.load(Ordering::SeqCst), 0);
    assert!(!watch.is_polling());
}

#[tokio::test]
async fn test_frames_after_generate_complete_attempt() {
    let backend = MockBackend {
        frames: Arc::new(vec![
            frame(20.0, "analyzing", "Reading the lesson"),
            frame(60.0, "creating_visuals", "Drawing"),
            frame(100.0, "completed", "Video ready"),
        ]),
        frames_after_generate: true,
        ..MockBackend::default()
    };
    let config = spawn_backend(backend.clone()).await;
    let client = ApiClient::new(&config.api, Credentials::anonymous()).unwrap();
    let push = PushChannel::new(&config.api.ws_base_url);
    let watch = ProjectWatch::open(6, client.video_handle(), Some(&push), &config.sync);
    assert!(eventually(|| watch.view().connected).await);
    assert_eq!(watch.view().percent, 0.0);

    watch.generate().await.unwrap();

    let view = tokio::time::timeout(Duration::from_secs(5), watch.wait_for_terminal())
        .await
        .unwrap();
    assert_eq!(view.status, GenerationStatus::Completed);
    assert_eq!(view.percent, 100.0);
    assert_eq!(view.attempt, 1);
    assert!(view.error.is_none());
    assert_eq!(backend.generate_calls.load(Ordering::SeqCst), 1);
}
