//! Result manifest model for generated 3D assets.
//!
//! The vendor reports finished jobs as a set of typed file URLs
//! ([`RemoteFile`]).  Materialization turns those into a
//! [`ModelManifest`]: the same files keyed by type, each annotated with a
//! local path once (and only once) its download has fully completed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// File type constants
// ---------------------------------------------------------------------------

/// The primary 3D model asset (vendor ships it as a ZIP bundle).
pub const FILE_TYPE_MODEL: &str = "OBJ";
/// Turntable animation of the generated model.
pub const FILE_TYPE_TURNTABLE: &str = "GIF";

/// Model file extensions in preference order: the primary format first,
/// then the accepted fallback formats.
pub const MODEL_EXTENSIONS: &[&str] = &["obj", "fbx", "gltf", "glb", "stl"];

// ---------------------------------------------------------------------------
// Vendor-side manifest
// ---------------------------------------------------------------------------

/// One file referenced by a completed vendor job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Vendor file-type tag, e.g. `"OBJ"` or `"GIF"`.
    pub file_type: String,
    /// Download URL (typically short-lived and signed).
    pub url: String,
}

// ---------------------------------------------------------------------------
// Normalized manifest
// ---------------------------------------------------------------------------

/// One materialized manifest entry.
///
/// `local_path` is only present when the file was written to disk without
/// error; a present path names a file that exists at the time the manifest
/// is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Original remote URL.
    pub url: String,
    /// Local filesystem path after a completed download, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    /// Preview image URL reported by the vendor for this asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image_url: Option<String>,
}

/// Normalized result record for one generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Storage key for this result (names the directory on disk).
    pub model_key: String,
    /// When materialization produced this record.
    pub created_at: Timestamp,
    /// Entries keyed by file-type tag.
    pub files: BTreeMap<String, ManifestEntry>,
}

impl ModelManifest {
    /// The entry holding the usable 3D asset: the model entry if present,
    /// otherwise the turntable animation.
    pub fn primary_asset(&self) -> Option<&ManifestEntry> {
        self.files
            .get(FILE_TYPE_MODEL)
            .or_else(|| self.files.get(FILE_TYPE_TURNTABLE))
    }

    /// Best available location for the primary asset: local path if the
    /// download completed, remote URL otherwise.
    pub fn primary_location(&self) -> Option<&str> {
        self.primary_asset()
            .map(|entry| entry.local_path.as_deref().unwrap_or(&entry.url))
    }

    /// Preview image URL, preferring the one attached to the primary asset.
    pub fn preview_url(&self) -> Option<&str> {
        self.primary_asset()
            .and_then(|entry| entry.preview_image_url.as_deref())
            .or_else(|| {
                self.files
                    .values()
                    .find_map(|entry| entry.preview_image_url.as_deref())
            })
    }
}

// ---------------------------------------------------------------------------
// Filename helpers
// ---------------------------------------------------------------------------

/// Extract a filename from a URL by taking the last path segment.
///
/// Strips query parameters and fragments. Falls back to `"download"` if
/// no meaningful segment is found.
pub fn extract_filename_from_url(url: &str) -> String {
    let clean = url.split('?').next().unwrap_or(url);
    let clean = clean.split('#').next().unwrap_or(clean);

    // Strip scheme and domain to get the path only.
    let path = if let Some(rest) = clean
        .strip_prefix("https://")
        .or_else(|| clean.strip_prefix("http://"))
    {
        rest.find('/').map(|i| &rest[i..]).unwrap_or("")
    } else {
        clean
    };

    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}

/// Preference rank of a filename as a 3D model asset.
///
/// Returns the index into [`MODEL_EXTENSIONS`] (lower is better), or
/// `None` if the extension is not a recognized model format.
pub fn model_extension_rank(filename: &str) -> Option<usize> {
    let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
    MODEL_EXTENSIONS.iter().position(|e| *e == ext)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(url: &str, local: Option<&str>) -> ManifestEntry {
        ManifestEntry {
            url: url.to_string(),
            local_path: local.map(str::to_string),
            preview_image_url: None,
        }
    }

    fn manifest(files: Vec<(&str, ManifestEntry)>) -> ModelManifest {
        ModelManifest {
            model_key: "model_test".to_string(),
            created_at: Utc::now(),
            files: files
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    // -- primary_asset ---------------------------------------------------------

    #[test]
    fn primary_prefers_model_over_turntable() {
        let m = manifest(vec![
            (FILE_TYPE_TURNTABLE, entry("http://x/m.gif", None)),
            (FILE_TYPE_MODEL, entry("http://x/m.zip", Some("/tmp/m.obj"))),
        ]);
        assert_eq!(m.primary_asset().unwrap().url, "http://x/m.zip");
    }

    #[test]
    fn primary_falls_back_to_turntable() {
        let m = manifest(vec![(FILE_TYPE_TURNTABLE, entry("http://x/m.gif", None))]);
        assert_eq!(m.primary_asset().unwrap().url, "http://x/m.gif");
    }

    #[test]
    fn primary_none_when_empty() {
        let m = manifest(vec![]);
        assert!(m.primary_asset().is_none());
    }

    // -- primary_location ------------------------------------------------------

    #[test]
    fn location_prefers_local_path() {
        let m = manifest(vec![(
            FILE_TYPE_MODEL,
            entry("http://x/m.zip", Some("/tmp/m.obj")),
        )]);
        assert_eq!(m.primary_location(), Some("/tmp/m.obj"));
    }

    #[test]
    fn location_falls_back_to_url() {
        let m = manifest(vec![(FILE_TYPE_MODEL, entry("http://x/m.zip", None))]);
        assert_eq!(m.primary_location(), Some("http://x/m.zip"));
    }

    // -- extract_filename_from_url ---------------------------------------------

    #[test]
    fn extract_simple_filename() {
        assert_eq!(
            extract_filename_from_url("https://example.com/files/model.zip"),
            "model.zip"
        );
    }

    #[test]
    fn extract_strips_query_params() {
        assert_eq!(
            extract_filename_from_url("https://example.com/m.zip?X-Tos-Signature=abc"),
            "m.zip"
        );
    }

    #[test]
    fn extract_empty_path_returns_default() {
        assert_eq!(extract_filename_from_url("https://example.com/"), "download");
    }

    // -- model_extension_rank --------------------------------------------------

    #[test]
    fn obj_ranks_first() {
        assert_eq!(model_extension_rank("pet/model.OBJ"), Some(0));
    }

    #[test]
    fn fallback_formats_rank_after_obj() {
        let obj = model_extension_rank("a.obj").unwrap();
        let glb = model_extension_rank("a.glb").unwrap();
        assert!(obj < glb);
    }

    #[test]
    fn unknown_extension_has_no_rank() {
        assert_eq!(model_extension_rank("readme.txt"), None);
        assert_eq!(model_extension_rank("noext"), None);
    }
}
