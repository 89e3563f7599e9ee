//! Result materialization.
//!
//! Turns a completed vendor job's file manifest into local assets:
//! downloads each referenced file, unpacks archive-packaged model
//! bundles, locates the usable 3D asset by extension preference, and
//! writes a `model_info.json` summary next to the files.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use petpal_core::manifest::{
    extract_filename_from_url, model_extension_rank, ManifestEntry, ModelManifest, RemoteFile,
    FILE_TYPE_MODEL, FILE_TYPE_TURNTABLE,
};
use petpal_core::types::DbId;

/// Name of the per-model summary file.
const MODEL_INFO_FILENAME: &str = "model_info.json";
/// Subdirectory archives are unpacked into.
const EXTRACT_DIR: &str = "extracted";

/// Errors that fail materialization as a whole.
///
/// Per-entry download/unpack failures are logged and skipped; only a
/// missing primary asset or a storage-level failure aborts.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// No model file (nor turntable fallback) could be obtained.
    #[error("no usable 3D asset in vendor result")]
    NoUsableAsset,

    /// Local storage failure (directory creation, summary write).
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads and normalizes vendor result files under a base directory.
pub struct Materializer {
    http: reqwest::Client,
    base_dir: PathBuf,
}

impl Materializer {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_dir,
        }
    }

    /// Materialize a completed job's files into `{base}/{model_key}/`.
    ///
    /// Partial success is acceptable: an entry that fails to download is
    /// recorded without a local path and processing continues. The call
    /// fails only if the primary asset cannot be obtained at all.
    pub async fn materialize(
        &self,
        job_id: &str,
        pet_id: Option<DbId>,
        files: &[RemoteFile],
        preview_image_url: Option<&str>,
    ) -> Result<ModelManifest, MaterializeError> {
        let model_key = model_key(job_id, pet_id);
        let model_dir = self.base_dir.join(&model_key);
        tokio::fs::create_dir_all(&model_dir).await?;

        let mut manifest = ModelManifest {
            model_key: model_key.clone(),
            created_at: chrono::Utc::now(),
            files: Default::default(),
        };

        for file in files {
            let filename = extract_filename_from_url(&file.url);
            let dest = model_dir.join(&filename);

            if let Err(e) = self.download_file(&file.url, &dest).await {
                tracing::error!(
                    file_type = %file.file_type,
                    url = %file.url,
                    error = %e,
                    "Download failed, skipping entry",
                );
                continue;
            }

            tracing::info!(file_type = %file.file_type, path = %dest.display(), "Downloaded result file");
            manifest.files.insert(
                file.file_type.clone(),
                ManifestEntry {
                    url: file.url.clone(),
                    local_path: Some(dest.to_string_lossy().into_owned()),
                    preview_image_url: None,
                },
            );

            if filename.to_ascii_lowercase().ends_with(".zip") {
                match self.unpack_model_archive(&dest, &model_dir).await {
                    Some(asset_path) => {
                        tracing::info!(path = %asset_path.display(), "Extracted model asset");
                        manifest.files.insert(
                            FILE_TYPE_MODEL.to_string(),
                            ManifestEntry {
                                url: file.url.clone(),
                                local_path: Some(asset_path.to_string_lossy().into_owned()),
                                preview_image_url: None,
                            },
                        );
                    }
                    None => {
                        tracing::warn!(
                            archive = %dest.display(),
                            "No model asset found in archive",
                        );
                    }
                }
            }
        }

        if manifest.primary_asset().is_none() {
            return Err(MaterializeError::NoUsableAsset);
        }

        if let Some(preview) = preview_image_url {
            attach_preview(&mut manifest, preview);
        }

        let summary = serde_json::to_vec_pretty(&manifest).unwrap_or_default();
        tokio::fs::write(model_dir.join(MODEL_INFO_FILENAME), summary).await?;

        Ok(manifest)
    }

    /// Stream a URL to a local file.
    ///
    /// On any error the partially written file is removed so a partial
    /// download can never surface as a successful entry.
    async fn download_file(&self, url: &str, dest: &Path) -> Result<(), String> {
        let result = self.try_download(url, dest).await;
        if result.is_err() {
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }

    async fn try_download(&self, url: &str, dest: &Path) -> Result<(), String> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| e.to_string())?;

        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            file.write_all(&chunk).await.map_err(|e| e.to_string())?;
        }

        file.flush().await.map_err(|e| e.to_string())
    }

    /// Unpack an archive and locate the best model asset inside it.
    ///
    /// Runs the blocking zip work off the async runtime. Returns `None`
    /// on unpack failure or when no recognized model file exists.
    async fn unpack_model_archive(&self, archive: &Path, model_dir: &Path) -> Option<PathBuf> {
        let archive = archive.to_path_buf();
        let extract_dir = model_dir.join(EXTRACT_DIR);

        let result = tokio::task::spawn_blocking(move || {
            extract_archive(&archive, &extract_dir).map(|()| find_model_asset(&extract_dir))
        })
        .await;

        match result {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Archive extraction failed");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Archive extraction task panicked");
                None
            }
        }
    }
}

/// Storage key for one generation result.
fn model_key(job_id: &str, pet_id: Option<DbId>) -> String {
    let safe_job: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    match pet_id {
        Some(pet_id) => format!("model_{safe_job}_{pet_id}"),
        None => format!("model_{safe_job}_unknown"),
    }
}

/// Unpack a zip archive into `extract_dir` (blocking).
fn extract_archive(archive: &Path, extract_dir: &Path) -> Result<(), String> {
    let file = std::fs::File::open(archive).map_err(|e| e.to_string())?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| e.to_string())?;
    std::fs::create_dir_all(extract_dir).map_err(|e| e.to_string())?;
    zip.extract(extract_dir).map_err(|e| e.to_string())
}

/// Find the best model asset under a directory tree.
///
/// Preference follows [`petpal_core::manifest::MODEL_EXTENSIONS`]: an
/// `.obj` anywhere beats any fallback format.
pub fn find_model_asset(dir: &Path) -> Option<PathBuf> {
    let mut best: Option<(usize, PathBuf)> = None;
    visit_files(dir, &mut |path| {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        if let Some(rank) = model_extension_rank(name) {
            if best.as_ref().map_or(true, |(r, _)| rank < *r) {
                best = Some((rank, path.to_path_buf()));
            }
        }
    });
    best.map(|(_, path)| path)
}

fn visit_files(dir: &Path, visit: &mut impl FnMut(&Path)) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            visit_files(&path, visit);
        } else {
            visit(&path);
        }
    }
}

/// Attach the vendor preview URL to the primary asset entry.
fn attach_preview(manifest: &mut ModelManifest, preview: &str) {
    let key = if manifest.files.contains_key(FILE_TYPE_MODEL) {
        FILE_TYPE_MODEL
    } else {
        FILE_TYPE_TURNTABLE
    };
    if let Some(entry) = manifest.files.get_mut(key) {
        entry.preview_image_url = Some(preview.to_string());
    }
}
