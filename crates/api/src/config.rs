use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public base URL used to build file links handed to clients.
    pub public_base_url: String,
    /// Directory uploaded images are stored in.
    pub upload_dir: PathBuf,
    /// Directory materialized model files are stored in.
    pub model_dir: PathBuf,

    /// Interval between vendor status polls.
    pub generation_poll_interval: Duration,
    /// Wall-clock budget for one generation's vendor wait.
    pub generation_budget: Duration,
    /// Task records older than this many days are purged by the sweep.
    pub task_retention_days: i64,

    /// Douyin mini-program credentials; when absent, login degrades to a
    /// deterministic mock openid.
    pub douyin_appid: Option<String>,
    pub douyin_secret: Option<String>,

    /// 3D generation gateway.
    pub hunyuan_api_url: String,
    pub hunyuan_secret_id: String,
    pub hunyuan_secret_key: String,
    pub hunyuan_region: String,

    /// Ark model gateway.
    pub ark_base_url: String,
    pub ark_api_key: String,
    pub ark_chat_model: String,
    pub ark_expand_model: String,
    pub ark_image_model: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                                    |
    /// |-----------------------------|--------------------------------------------|
    /// | `HOST`                      | `0.0.0.0`                                  |
    /// | `PORT`                      | `3000`                                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`                    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                                       |
    /// | `PUBLIC_BASE_URL`           | `http://localhost:3000`                    |
    /// | `UPLOAD_DIR`                | `uploads`                                  |
    /// | `MODEL_DIR`                 | `storage/models`                           |
    /// | `GENERATION_POLL_SECS`      | `2`                                        |
    /// | `GENERATION_BUDGET_SECS`    | `300`                                      |
    /// | `TASK_RETENTION_DAYS`       | `7`                                        |
    /// | `DOUYIN_APPID` / `DOUYIN_SECRET` | unset (mock login)                    |
    /// | `HUNYUAN_API_URL`           | `https://ai3d.tencentcloudapi.com`         |
    /// | `HUNYUAN_SECRET_ID` / `HUNYUAN_SECRET_KEY` | empty                       |
    /// | `HUNYUAN_REGION`            | `ap-guangzhou`                             |
    /// | `ARK_BASE_URL`              | `https://ark.cn-beijing.volces.com/api/v3` |
    /// | `ARK_API_KEY`               | empty                                      |
    /// | `ARK_CHAT_MODEL`            | `doubao-1-5-pro-256k-250115`               |
    /// | `ARK_EXPAND_MODEL`          | `doubao-seed-1-6-250615`                   |
    /// | `ARK_IMAGE_MODEL`           | `doubao-seededit-3-0-i2i-250628`           |
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let generation_poll_secs: u64 = env_or("GENERATION_POLL_SECS", "2")
            .parse()
            .expect("GENERATION_POLL_SECS must be a valid u64");

        let generation_budget_secs: u64 = env_or("GENERATION_BUDGET_SECS", "300")
            .parse()
            .expect("GENERATION_BUDGET_SECS must be a valid u64");

        let task_retention_days: i64 = env_or("TASK_RETENTION_DAYS", "7")
            .parse()
            .expect("TASK_RETENTION_DAYS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:3000"),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            model_dir: PathBuf::from(env_or("MODEL_DIR", "storage/models")),
            generation_poll_interval: Duration::from_secs(generation_poll_secs),
            generation_budget: Duration::from_secs(generation_budget_secs),
            task_retention_days,
            douyin_appid: env_opt("DOUYIN_APPID"),
            douyin_secret: env_opt("DOUYIN_SECRET"),
            hunyuan_api_url: env_or("HUNYUAN_API_URL", "https://ai3d.tencentcloudapi.com"),
            hunyuan_secret_id: env_or("HUNYUAN_SECRET_ID", ""),
            hunyuan_secret_key: env_or("HUNYUAN_SECRET_KEY", ""),
            hunyuan_region: env_or("HUNYUAN_REGION", "ap-guangzhou"),
            ark_base_url: env_or("ARK_BASE_URL", "https://ark.cn-beijing.volces.com/api/v3"),
            ark_api_key: env_or("ARK_API_KEY", ""),
            ark_chat_model: env_or("ARK_CHAT_MODEL", "doubao-1-5-pro-256k-250115"),
            ark_expand_model: env_or("ARK_EXPAND_MODEL", "doubao-seed-1-6-250615"),
            ark_image_model: env_or("ARK_IMAGE_MODEL", "doubao-seededit-3-0-i2i-250628"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
