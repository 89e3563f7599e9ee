use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use petpal_api::config::ServerConfig;
use petpal_api::{background, router, state};
use petpal_ark::{ArkClient, ArkConfig};
use petpal_hunyuan::{HunyuanClient, HunyuanConfig};
use petpal_tasks::{ModelJobService, PgPetBridge, TaskManager, TaskManagerConfig};

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petpal_api=debug,petpal_tasks=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = petpal_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    petpal_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    petpal_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Vendor clients ---
    let hunyuan = HunyuanClient::new(HunyuanConfig {
        api_url: config.hunyuan_api_url.clone(),
        secret_id: config.hunyuan_secret_id.clone(),
        secret_key: config.hunyuan_secret_key.clone(),
        region: config.hunyuan_region.clone(),
    });

    let ark = Arc::new(ArkClient::new(ArkConfig {
        base_url: config.ark_base_url.clone(),
        api_key: config.ark_api_key.clone(),
        chat_model: config.ark_chat_model.clone(),
        expand_model: config.ark_expand_model.clone(),
        image_model: config.ark_image_model.clone(),
    }));

    // --- Task manager ---
    let service: Arc<dyn ModelJobService> = Arc::new(hunyuan);
    let bridge = Arc::new(PgPetBridge::new(pool.clone()));
    let tasks = TaskManager::start(
        service,
        bridge,
        TaskManagerConfig {
            poll_interval: config.generation_poll_interval,
            poll_budget: config.generation_budget,
            storage_dir: config.model_dir.clone(),
        },
    );
    tracing::info!("Task manager started");

    // --- Task retention sweep ---
    let retention_cancel = tokio_util::sync::CancellationToken::new();
    let retention_handle = tokio::spawn(background::task_retention::run(
        Arc::clone(&tasks),
        config.task_retention_days,
        retention_cancel.clone(),
    ));

    // --- App state ---
    let app_state = AppState {
        pool,
        config: Arc::new(config.clone()),
        tasks: Arc::clone(&tasks),
        ark,
        http: reqwest::Client::new(),
    };

    // --- Router ---
    let app = router::build_app_router(app_state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop the retention sweep.
    retention_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), retention_handle).await;
    tracing::info!("Task retention job stopped");

    // Stop the task worker (abandoning in-flight generation if needed).
    tasks.shutdown().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
