//! HTTP client for the 3D generation job endpoints.
//!
//! Wraps the submit/query REST pair using [`reqwest`]. The service is
//! treated as a black box keyed by the job id string it returns.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;

use petpal_core::manifest::RemoteFile;

use crate::request::{is_private_network_url, SubmitJobRequest};

/// Connection settings for the 3D generation gateway.
#[derive(Debug, Clone)]
pub struct HunyuanConfig {
    /// Base HTTP URL of the gateway.
    pub api_url: String,
    /// Credential pair forwarded with every request.
    pub secret_id: String,
    pub secret_key: String,
    /// Service region, e.g. `ap-guangzhou`.
    pub region: String,
}

/// HTTP client for the 3D generation service.
pub struct HunyuanClient {
    client: reqwest::Client,
    config: HunyuanConfig,
}

/// Response returned by the submit endpoint after queuing a job.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubmitJobResponse {
    job_id: String,
}

/// Response returned by the query endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryJobResponse {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<String>,
    #[serde(rename = "Progress", default)]
    pub progress: Option<u8>,
    #[serde(rename = "ResultFile3Ds", default)]
    pub result_files: Vec<ResultFile3D>,
}

/// One generated result set (the service returns at most one today).
#[derive(Debug, Clone, Deserialize)]
pub struct ResultFile3D {
    #[serde(rename = "PreviewImageUrl", default)]
    pub preview_image_url: Option<String>,
    #[serde(rename = "File3D", default)]
    pub files: Vec<File3D>,
}

/// One file within a result set.
#[derive(Debug, Clone, Deserialize)]
pub struct File3D {
    #[serde(rename = "Type", default)]
    pub file_type: Option<String>,
    #[serde(rename = "Url", default)]
    pub url: Option<String>,
}

/// Vendor-reported job state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Waiting,
    Running,
    Done,
    Failed,
    /// A status string this client does not recognize.
    Other(String),
}

impl QueryJobResponse {
    /// Parse the vendor status string.
    pub fn job_status(&self) -> JobStatus {
        match self.status.as_str() {
            "WAIT" => JobStatus::Waiting,
            "RUN" => JobStatus::Running,
            "DONE" => JobStatus::Done,
            "FAIL" | "FAILED" => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        }
    }

    /// Preview image URL from the first result set, if any.
    pub fn preview_image_url(&self) -> Option<String> {
        self.result_files
            .first()
            .and_then(|r| r.preview_image_url.clone())
    }

    /// Typed file references from the first result set.
    ///
    /// Entries missing a type or URL are dropped.
    pub fn remote_files(&self) -> Vec<RemoteFile> {
        self.result_files
            .first()
            .map(|r| {
                r.files
                    .iter()
                    .filter_map(|f| match (&f.file_type, &f.url) {
                        (Some(t), Some(u)) => Some(RemoteFile {
                            file_type: t.clone(),
                            url: u.clone(),
                        }),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Errors from the 3D generation REST layer.
#[derive(Debug, thiserror::Error)]
pub enum HunyuanError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Hunyuan API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The pre-submit image fetch for a private URL failed.
    #[error("Image fetch failed: {0}")]
    ImageFetch(String),
}

impl HunyuanClient {
    /// Create a new client for the 3D generation gateway.
    pub fn new(config: HunyuanConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across services).
    pub fn with_client(client: reqwest::Client, config: HunyuanConfig) -> Self {
        Self { client, config }
    }

    /// Submit a generation job, returning the vendor job id.
    pub async fn submit_job(&self, request: &SubmitJobRequest) -> Result<String, HunyuanError> {
        let response = self
            .client
            .post(format!("{}/jobs", self.config.api_url))
            .bearer_auth(&self.config.secret_key)
            .header("X-TC-Secret-Id", &self.config.secret_id)
            .header("X-TC-Region", &self.config.region)
            .json(request)
            .send()
            .await?;

        let parsed: SubmitJobResponse = Self::parse_response(response).await?;

        tracing::info!(job_id = %parsed.job_id, "3D generation job submitted");
        Ok(parsed.job_id)
    }

    /// Query the state of a previously submitted job.
    pub async fn query_job(&self, job_id: &str) -> Result<QueryJobResponse, HunyuanError> {
        let response = self
            .client
            .get(format!("{}/jobs/{}", self.config.api_url, job_id))
            .bearer_auth(&self.config.secret_key)
            .header("X-TC-Secret-Id", &self.config.secret_id)
            .header("X-TC-Region", &self.config.region)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Build an image-mode submission for a URL.
    ///
    /// Public URLs are passed through for the vendor to fetch. Private or
    /// loopback URLs are unreachable from the vendor side, so the bytes
    /// are fetched here and resubmitted inline as base64.
    pub async fn prepare_image_request(
        &self,
        image_url: &str,
    ) -> Result<SubmitJobRequest, HunyuanError> {
        if !is_private_network_url(image_url) {
            return Ok(SubmitJobRequest::from_image_url(image_url));
        }

        tracing::info!(url = %image_url, "Private image URL, fetching bytes for inline submission");

        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| HunyuanError::ImageFetch(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HunyuanError::ImageFetch(e.to_string()))?;

        Ok(SubmitJobRequest::from_image_base64(BASE64.encode(&bytes)))
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the response
    /// unchanged on success, or a [`HunyuanError::Api`] containing the
    /// status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, HunyuanError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HunyuanError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, HunyuanError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_response(json: serde_json::Value) -> QueryJobResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn status_strings_map_to_job_status() {
        for (s, expected) in [
            ("WAIT", JobStatus::Waiting),
            ("RUN", JobStatus::Running),
            ("DONE", JobStatus::Done),
            ("FAIL", JobStatus::Failed),
            ("FAILED", JobStatus::Failed),
        ] {
            let resp = query_response(serde_json::json!({ "Status": s }));
            assert_eq!(resp.job_status(), expected);
        }
    }

    #[test]
    fn unknown_status_preserved() {
        let resp = query_response(serde_json::json!({ "Status": "EXPLODED" }));
        assert_eq!(resp.job_status(), JobStatus::Other("EXPLODED".to_string()));
    }

    #[test]
    fn remote_files_extracted_from_first_result() {
        let resp = query_response(serde_json::json!({
            "Status": "DONE",
            "ResultFile3Ds": [{
                "PreviewImageUrl": "https://cdn.example.com/p.png",
                "File3D": [
                    { "Type": "OBJ", "Url": "https://cdn.example.com/m.zip" },
                    { "Type": "GIF", "Url": "https://cdn.example.com/m.gif" },
                    { "Type": "PLY" }
                ]
            }]
        }));

        let files = resp.remote_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].file_type, "OBJ");
        assert_eq!(files[1].url, "https://cdn.example.com/m.gif");
        assert_eq!(
            resp.preview_image_url().as_deref(),
            Some("https://cdn.example.com/p.png")
        );
    }

    #[test]
    fn empty_results_yield_no_files() {
        let resp = query_response(serde_json::json!({ "Status": "DONE" }));
        assert!(resp.remote_files().is_empty());
        assert!(resp.preview_image_url().is_none());
    }
}
