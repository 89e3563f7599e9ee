//! Integration tests for the task manager and generation pipeline.
//!
//! The vendor is scripted through [`ModelJobService`] and pet writes are
//! captured by a recording bridge; the end-to-end cases download real
//! bytes from a loopback HTTP server.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use petpal_core::manifest::RemoteFile;
use petpal_tasks::{
    JobInput, JobPoll, ModelJobService, PetBridge, ServiceError, TaskManager, TaskManagerConfig,
    TaskParams, TaskStatus,
};

// ---------------------------------------------------------------------------
// Scripted vendor service
// ---------------------------------------------------------------------------

enum MockResponse {
    /// Job never finishes.
    Running,
    /// Job fails with this message.
    Fail(String),
    /// Job is done on the first successful poll.
    Done {
        files: Vec<RemoteFile>,
        preview: Option<String>,
    },
}

struct ScriptedService {
    response: MockResponse,
    /// Prompts/image URLs in submission order.
    submitted: StdMutex<Vec<String>>,
    /// Number of initial polls that fail with a transport error.
    poll_failures: AtomicUsize,
}

impl ScriptedService {
    fn new(response: MockResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            submitted: StdMutex::new(Vec::new()),
            poll_failures: AtomicUsize::new(0),
        })
    }

    fn with_poll_failures(response: MockResponse, failures: usize) -> Arc<Self> {
        let service = Self::new(response);
        service.poll_failures.store(failures, Ordering::SeqCst);
        service
    }

    fn submissions(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelJobService for ScriptedService {
    async fn submit(&self, input: &JobInput) -> Result<String, ServiceError> {
        let label = input
            .prompt
            .clone()
            .or_else(|| input.image_url.clone())
            .unwrap_or_default();
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(label);
        Ok(format!("job-{}", submitted.len()))
    }

    async fn poll(&self, _job_id: &str) -> Result<JobPoll, ServiceError> {
        if self
            .poll_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ServiceError::Transport("connection reset".to_string()));
        }

        Ok(match &self.response {
            MockResponse::Running => JobPoll::Running { progress: Some(42) },
            MockResponse::Fail(message) => JobPoll::Failed {
                message: message.clone(),
            },
            MockResponse::Done { files, preview } => JobPoll::Done {
                files: files.clone(),
                preview_image_url: preview.clone(),
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Recording pet bridge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum BridgeEvent {
    Generating(i64),
    Completed(i64, String),
    Failed(i64),
    TimedOut(i64),
}

#[derive(Default)]
struct RecordingBridge {
    events: StdMutex<Vec<BridgeEvent>>,
}

impl RecordingBridge {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn events(&self) -> Vec<BridgeEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl PetBridge for RecordingBridge {
    async fn mark_generating(&self, pet_id: i64) {
        self.events.lock().unwrap().push(BridgeEvent::Generating(pet_id));
    }

    async fn apply_completed(&self, pet_id: i64, manifest: &petpal_core::manifest::ModelManifest) {
        let location = manifest.primary_location().unwrap_or("<none>").to_string();
        self.events
            .lock()
            .unwrap()
            .push(BridgeEvent::Completed(pet_id, location));
    }

    async fn mark_failed(&self, pet_id: i64) {
        self.events.lock().unwrap().push(BridgeEvent::Failed(pet_id));
    }

    async fn mark_timed_out(&self, pet_id: i64) {
        self.events.lock().unwrap().push(BridgeEvent::TimedOut(pet_id));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_manager(
    service: Arc<dyn ModelJobService>,
    bridge: Arc<dyn PetBridge>,
    storage_dir: std::path::PathBuf,
    poll_interval: Duration,
    poll_budget: Duration,
) -> Arc<TaskManager> {
    TaskManager::start(
        service,
        bridge,
        TaskManagerConfig {
            poll_interval,
            poll_budget,
            storage_dir,
        },
    )
}

fn prompt_params(prompt: &str, pet_id: Option<i64>) -> TaskParams {
    TaskParams {
        prompt: Some(prompt.to_string()),
        image_url: None,
        pet_id,
    }
}

/// Poll until the task reaches a terminal status (or the deadline passes).
async fn wait_terminal(
    manager: &TaskManager,
    task_id: &str,
    deadline: Duration,
) -> petpal_tasks::TaskSnapshot {
    let started = Instant::now();
    loop {
        if let Some(snapshot) = manager.snapshot(task_id).await {
            if snapshot.status.is_terminal() {
                return snapshot;
            }
        }
        assert!(
            started.elapsed() < deadline,
            "task {task_id} did not reach a terminal state within {deadline:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Serve a fixed byte payload at `/files/{name}` on a loopback port.
async fn serve_file(name: &'static str, bytes: Vec<u8>) -> SocketAddr {
    let app = axum::Router::new().route(
        &format!("/files/{name}"),
        axum::routing::get(move || {
            let bytes = bytes.clone();
            async move { bytes }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A zip archive holding one model file and one texture.
fn model_zip_bytes() -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("pet/model.obj", options).unwrap();
        writer.write_all(b"o pet\nv 0 0 0\n").unwrap();
        writer.start_file("pet/texture.png", options).unwrap();
        writer.write_all(b"png").unwrap();
        writer.finish().unwrap();
    }
    cursor.into_inner()
}

// ---------------------------------------------------------------------------
// Submission behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_returns_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Running),
        RecordingBridge::new(),
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    let started = Instant::now();
    let task_id = manager.submit(prompt_params("test", None)).await.unwrap();
    assert!(
        started.elapsed() < Duration::from_millis(100),
        "submit must not wait for the worker"
    );

    let snapshot = manager.snapshot(&task_id).await.unwrap();
    assert!(!snapshot.status.is_terminal());
}

#[tokio::test]
async fn invalid_params_never_reach_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Running),
        RecordingBridge::new(),
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    let both = TaskParams {
        prompt: Some("prompt".to_string()),
        image_url: Some("https://example.com/a.png".to_string()),
        pet_id: None,
    };
    assert!(manager.submit(both).await.is_err());

    let neither = TaskParams {
        prompt: None,
        image_url: None,
        pet_id: None,
    };
    assert!(manager.submit(neither).await.is_err());

    assert_eq!(manager.task_count().await, 0);
}

#[tokio::test]
async fn unknown_task_snapshot_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Running),
        RecordingBridge::new(),
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    assert!(manager.snapshot("no-such-task").await.is_none());
}

// ---------------------------------------------------------------------------
// Terminal outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn vendor_failure_yields_failed_with_vendor_message() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = RecordingBridge::new();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Fail("quota exceeded".to_string())),
        Arc::clone(&bridge) as Arc<dyn PetBridge>,
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    let task_id = manager.submit(prompt_params("test", Some(7))).await.unwrap();
    let snapshot = wait_terminal(&manager, &task_id, Duration::from_secs(5)).await;

    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert_eq!(snapshot.error.as_deref(), Some("quota exceeded"));
    assert!(snapshot.result.is_none());
    assert!(snapshot.ended_at.is_some());

    let events = bridge.events();
    assert_eq!(
        events,
        vec![BridgeEvent::Generating(7), BridgeEvent::Failed(7)]
    );
}

#[tokio::test]
async fn budget_expiry_yields_timeout_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = RecordingBridge::new();
    let poll_interval = Duration::from_millis(25);
    let poll_budget = Duration::from_millis(200);
    let manager = start_manager(
        ScriptedService::new(MockResponse::Running),
        Arc::clone(&bridge) as Arc<dyn PetBridge>,
        dir.path().to_path_buf(),
        poll_interval,
        poll_budget,
    );

    let submitted = Instant::now();
    let task_id = manager.submit(prompt_params("test", Some(3))).await.unwrap();
    let snapshot = wait_terminal(&manager, &task_id, Duration::from_secs(5)).await;
    let elapsed = submitted.elapsed();

    assert_eq!(snapshot.status, TaskStatus::Timeout);
    assert!(snapshot.error.is_none());

    // Terminal at approximately the budget boundary: after the budget,
    // within a few poll intervals of slack.
    assert!(elapsed >= poll_budget, "timed out before the budget elapsed");
    assert!(
        elapsed < poll_budget + Duration::from_secs(1),
        "timeout observed far past the budget boundary"
    );

    let events = bridge.events();
    assert_eq!(
        events,
        vec![BridgeEvent::Generating(3), BridgeEvent::TimedOut(3)]
    );
}

#[tokio::test]
async fn end_to_end_archive_materialization() {
    let addr = serve_file("model.zip", model_zip_bytes()).await;
    let zip_url = format!("http://{addr}/files/model.zip");
    let preview_url = format!("http://{addr}/preview.gif");

    let dir = tempfile::tempdir().unwrap();
    let bridge = RecordingBridge::new();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Done {
            files: vec![RemoteFile {
                file_type: "OBJ".to_string(),
                url: zip_url,
            }],
            preview: Some(preview_url.clone()),
        }),
        Arc::clone(&bridge) as Arc<dyn PetBridge>,
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    let task_id = manager.submit(prompt_params("test", Some(11))).await.unwrap();
    let snapshot = wait_terminal(&manager, &task_id, Duration::from_secs(10)).await;

    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(snapshot.progress, 100);
    assert!(snapshot.error.is_none());

    let manifest = snapshot.result.expect("completed task must carry a result");
    let model_path = manifest
        .primary_asset()
        .and_then(|entry| entry.local_path.clone())
        .expect("primary asset must have a local path");
    assert!(model_path.ends_with(".obj"));
    assert!(
        std::path::Path::new(&model_path).exists(),
        "manifest local path must name an existing file"
    );
    assert_eq!(manifest.preview_url(), Some(preview_url.as_str()));

    // Pet callbacks: generating once, completed once with the local path.
    let events = bridge.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], BridgeEvent::Generating(11));
    assert_eq!(events[1], BridgeEvent::Completed(11, model_path));

    // Terminal states are absorbing: late writes change nothing.
    manager.update_progress(&task_id, 10, Some("late")).await;
    let after = manager.snapshot(&task_id).await.unwrap();
    assert_eq!(after.status, TaskStatus::Completed);
    assert_eq!(after.progress, 100);
}

#[tokio::test]
async fn transient_poll_errors_are_retried() {
    let addr = serve_file("turntable.gif", b"GIF89a".to_vec()).await;
    let gif_url = format!("http://{addr}/files/turntable.gif");

    let dir = tempfile::tempdir().unwrap();
    let service = ScriptedService::with_poll_failures(
        MockResponse::Done {
            files: vec![RemoteFile {
                file_type: "GIF".to_string(),
                url: gif_url,
            }],
            preview: None,
        },
        2,
    );
    let manager = start_manager(
        service,
        RecordingBridge::new(),
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    let task_id = manager.submit(prompt_params("test", None)).await.unwrap();
    let snapshot = wait_terminal(&manager, &task_id, Duration::from_secs(10)).await;

    // Two failed status queries must not fail the task; with no model
    // archive the turntable is an acceptable primary asset.
    assert_eq!(snapshot.status, TaskStatus::Completed);
}

#[tokio::test]
async fn empty_vendor_result_fails_materialization() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = RecordingBridge::new();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Done {
            files: Vec::new(),
            preview: None,
        }),
        Arc::clone(&bridge) as Arc<dyn PetBridge>,
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    let task_id = manager.submit(prompt_params("test", Some(5))).await.unwrap();
    let snapshot = wait_terminal(&manager, &task_id, Duration::from_secs(5)).await;

    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert!(snapshot
        .error
        .as_deref()
        .unwrap()
        .contains("no usable 3D asset"));
    assert!(bridge.events().contains(&BridgeEvent::Failed(5)));
}

// ---------------------------------------------------------------------------
// Queue ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tasks_are_processed_in_submission_order() {
    let addr = serve_file("turntable.gif", b"GIF89a".to_vec()).await;
    let gif_url = format!("http://{addr}/files/turntable.gif");

    let dir = tempfile::tempdir().unwrap();
    let service = ScriptedService::new(MockResponse::Done {
        files: vec![RemoteFile {
            file_type: "GIF".to_string(),
            url: gif_url,
        }],
        preview: None,
    });
    let manager = start_manager(
        Arc::clone(&service) as Arc<dyn ModelJobService>,
        RecordingBridge::new(),
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    let first = manager.submit(prompt_params("first", None)).await.unwrap();
    let second = manager.submit(prompt_params("second", None)).await.unwrap();

    wait_terminal(&manager, &first, Duration::from_secs(10)).await;
    wait_terminal(&manager, &second, Duration::from_secs(10)).await;

    assert_eq!(service.submissions(), vec!["first", "second"]);
}

// ---------------------------------------------------------------------------
// Retention sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_removes_in_flight_task_and_late_writes_are_silent() {
    let dir = tempfile::tempdir().unwrap();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Running),
        RecordingBridge::new(),
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_millis(300),
    );

    let task_id = manager.submit(prompt_params("test", None)).await.unwrap();

    // Let the worker pick it up.
    let started = Instant::now();
    loop {
        let snapshot = manager.snapshot(&task_id).await;
        match snapshot {
            Some(s) if s.status == TaskStatus::Processing => break,
            _ => {}
        }
        assert!(started.elapsed() < Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Zero max-age makes every existing record "too old".
    let removed = manager.sweep_older_than(chrono::Duration::zero()).await;
    assert_eq!(removed, 1);

    assert!(manager.snapshot(&task_id).await.is_none());
    assert_eq!(manager.task_count().await, 0);

    // The worker is still driving the swept task; progress updates and
    // its eventual terminal write must disappear without a panic.
    manager.update_progress(&task_id, 99, Some("late")).await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(manager.snapshot(&task_id).await.is_none());
}

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_stops_the_worker_and_closes_the_queue() {
    let dir = tempfile::tempdir().unwrap();
    let manager = start_manager(
        ScriptedService::new(MockResponse::Running),
        RecordingBridge::new(),
        dir.path().to_path_buf(),
        Duration::from_millis(20),
        Duration::from_secs(5),
    );

    manager.shutdown().await;

    let result = manager.submit(prompt_params("after shutdown", None)).await;
    assert!(result.is_err());
}
