//! Mini-program login against the Douyin open platform.
//!
//! Exchanges the client-side login `code` for the user's openid via
//! `jscode2session`. When the platform credentials are missing or the
//! call fails, login degrades to a deterministic mock openid derived
//! from the code, so local development works without credentials.

use sha2::{Digest, Sha256};

use crate::config::ServerConfig;

/// Resolve the openid for a login code, falling back to a mock id.
pub async fn resolve_openid(http: &reqwest::Client, config: &ServerConfig, code: &str) -> String {
    match (&config.douyin_appid, &config.douyin_secret) {
        (Some(appid), Some(secret)) => match fetch_openid(http, appid, secret, code).await {
            Ok(openid) => {
                tracing::info!(openid = %openid, "Douyin login succeeded");
                return openid;
            }
            Err(e) => {
                tracing::warn!(error = %e, "jscode2session failed, using mock openid");
            }
        },
        _ => {
            tracing::warn!("Douyin credentials not configured, using mock openid");
        }
    }
    mock_openid(code)
}

async fn fetch_openid(
    http: &reqwest::Client,
    appid: &str,
    secret: &str,
    code: &str,
) -> Result<String, String> {
    let url = format!(
        "https://developer.toutiao.com/api/apps/jscode2session?appid={appid}&secret={secret}&code={code}"
    );

    let body: serde_json::Value = http
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?
        .json()
        .await
        .map_err(|e| e.to_string())?;

    body.get("openid")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            format!(
                "no openid in response: {}",
                body.get("errmsg").and_then(|v| v.as_str()).unwrap_or("unknown error")
            )
        })
}

/// Deterministic mock openid for a login code.
pub fn mock_openid(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("douyin_{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_openid_is_deterministic() {
        assert_eq!(mock_openid("abc"), mock_openid("abc"));
    }

    #[test]
    fn mock_openid_differs_per_code() {
        assert_ne!(mock_openid("abc"), mock_openid("abd"));
    }

    #[test]
    fn mock_openid_has_expected_shape() {
        let id = mock_openid("some-code");
        assert!(id.starts_with("douyin_"));
        assert_eq!(id.len(), "douyin_".len() + 16);
    }
}
