//! Submission payload for the 3D generation service.

use serde::Serialize;

/// The vendor rejects prompts longer than this many characters.
pub const MAX_PROMPT_CHARS: usize = 200;

/// Body of a `POST /jobs` submission.
///
/// Exactly one of the three fields is set; the constructors below are the
/// only way to build one, so an empty or mixed request cannot be
/// represented.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl SubmitJobRequest {
    /// Text-to-3D submission. The prompt is truncated to
    /// [`MAX_PROMPT_CHARS`] characters with a warning.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            prompt: Some(truncate_prompt(prompt)),
            image_url: None,
            image_base64: None,
        }
    }

    /// Image-to-3D submission by URL (the vendor fetches the image).
    pub fn from_image_url(url: &str) -> Self {
        Self {
            prompt: None,
            image_url: Some(url.to_string()),
            image_base64: None,
        }
    }

    /// Image-to-3D submission with inline base64 image data.
    pub fn from_image_base64(data: String) -> Self {
        Self {
            prompt: None,
            image_url: None,
            image_base64: Some(data),
        }
    }
}

/// Truncate a prompt to [`MAX_PROMPT_CHARS`] characters.
///
/// Counts characters, not bytes, so multi-byte text is cut on a char
/// boundary.
pub fn truncate_prompt(prompt: &str) -> String {
    if prompt.chars().count() <= MAX_PROMPT_CHARS {
        return prompt.to_string();
    }
    tracing::warn!(
        chars = prompt.chars().count(),
        max = MAX_PROMPT_CHARS,
        "Prompt exceeds vendor limit, truncating",
    );
    prompt.chars().take(MAX_PROMPT_CHARS).collect()
}

/// Whether a URL points at a network location the vendor cannot reach.
///
/// Covers the loopback and LAN addresses the upload endpoint hands out in
/// local deployments. Images behind such URLs must be fetched by us and
/// resubmitted inline.
pub fn is_private_network_url(url: &str) -> bool {
    url.starts_with("http://127.0.0.1")
        || url.starts_with("http://localhost")
        || url.starts_with("http://192.168.")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- truncate_prompt -------------------------------------------------------

    #[test]
    fn short_prompt_unchanged() {
        assert_eq!(truncate_prompt("一只可爱的小狗"), "一只可爱的小狗");
    }

    #[test]
    fn long_prompt_cut_to_limit() {
        let long: String = "狗".repeat(MAX_PROMPT_CHARS + 50);
        let cut = truncate_prompt(&long);
        assert_eq!(cut.chars().count(), MAX_PROMPT_CHARS);
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        // Mixed-width text: byte-based truncation would panic or split a
        // code point; char-based truncation must not.
        let long = format!("ab{}", "猫".repeat(MAX_PROMPT_CHARS));
        let cut = truncate_prompt(&long);
        assert_eq!(cut.chars().count(), MAX_PROMPT_CHARS);
        assert!(cut.starts_with("ab"));
    }

    // -- is_private_network_url ------------------------------------------------

    #[test]
    fn loopback_and_lan_urls_detected() {
        assert!(is_private_network_url("http://127.0.0.1:5000/uploads/a.png"));
        assert!(is_private_network_url("http://localhost:3000/uploads/a.png"));
        assert!(is_private_network_url("http://192.168.1.4/uploads/a.png"));
    }

    #[test]
    fn public_urls_not_detected() {
        assert!(!is_private_network_url("https://example.com/a.png"));
        assert!(!is_private_network_url("http://example.com/a.png"));
        // TLS loopback is not something the upload endpoint produces.
        assert!(!is_private_network_url("https://127.0.0.1/a.png"));
    }

    // -- SubmitJobRequest ------------------------------------------------------

    #[test]
    fn prompt_request_serializes_single_field() {
        let req = SubmitJobRequest::from_prompt("一只小猫");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["Prompt"], "一只小猫");
        assert!(json.get("ImageUrl").is_none());
        assert!(json.get("ImageBase64").is_none());
    }

    #[test]
    fn image_request_serializes_single_field() {
        let req = SubmitJobRequest::from_image_url("https://example.com/a.png");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["ImageUrl"], "https://example.com/a.png");
        assert!(json.get("Prompt").is_none());
    }
}
