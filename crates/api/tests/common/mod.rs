use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use petpal_api::config::ServerConfig;
use petpal_api::router::build_app_router;
use petpal_api::state::AppState;
use petpal_ark::{ArkClient, ArkConfig};
use petpal_tasks::{
    JobInput, JobPoll, ModelJobService, PgPetBridge, ServiceError, TaskManager, TaskManagerConfig,
};

/// Vendor stub used by API tests: submission succeeds, the first poll
/// reports a vendor failure, so tasks settle quickly without network.
struct StubJobService;

#[async_trait]
impl ModelJobService for StubJobService {
    async fn submit(&self, _input: &JobInput) -> Result<String, ServiceError> {
        Ok("job-test".to_string())
    }

    async fn poll(&self, _job_id: &str) -> Result<JobPoll, ServiceError> {
        Ok(JobPoll::Failed {
            message: "vendor disabled in tests".to_string(),
        })
    }
}

fn test_storage_dir(kind: &str) -> PathBuf {
    std::env::temp_dir().join(format!("petpal-test-{kind}"))
}

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout. No vendor credentials are configured,
/// so login uses the mock openid path.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        public_base_url: "http://localhost:3000".to_string(),
        upload_dir: test_storage_dir("uploads"),
        model_dir: test_storage_dir("models"),
        generation_poll_interval: Duration::from_millis(10),
        generation_budget: Duration::from_secs(1),
        task_retention_days: 7,
        douyin_appid: None,
        douyin_secret: None,
        hunyuan_api_url: "http://127.0.0.1:9".to_string(),
        hunyuan_secret_id: "test".to_string(),
        hunyuan_secret_key: "test".to_string(),
        hunyuan_region: "ap-guangzhou".to_string(),
        ark_base_url: "http://127.0.0.1:9".to_string(),
        ark_api_key: "test".to_string(),
        ark_chat_model: "test-chat".to_string(),
        ark_expand_model: "test-expand".to_string(),
        ark_image_model: "test-image".to_string(),
    }
}

/// Build the full application router with all middleware layers, using
/// the given database pool.
///
/// This mirrors the router construction in `main.rs` (including a live
/// task manager backed by the vendor stub) so integration tests exercise
/// the same stack that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let tasks = TaskManager::start(
        Arc::new(StubJobService),
        Arc::new(PgPetBridge::new(pool.clone())),
        TaskManagerConfig {
            poll_interval: config.generation_poll_interval,
            poll_budget: config.generation_budget,
            storage_dir: config.model_dir.clone(),
        },
    );

    let ark = Arc::new(ArkClient::new(ArkConfig {
        base_url: config.ark_base_url.clone(),
        api_key: config.ark_api_key.clone(),
        chat_model: config.ark_chat_model.clone(),
        expand_model: config.ark_expand_model.clone(),
        image_model: config.ark_image_model.clone(),
    }));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        tasks,
        ark,
        http: reqwest::Client::new(),
    };

    build_app_router(state, &config)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a POST request with a JSON body against the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
