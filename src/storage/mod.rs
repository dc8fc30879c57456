//! Upload pipeline: extension validation, collision-safe naming, optional
//! JPEG re-encode, and directory listing with humanized metadata.

mod compress;

pub use compress::compress_to_jpeg;

use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::errors::StorageError;

/// Byte counts before and after compression, reported alongside the URL.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SizeInfo {
    pub original_bytes: u64,
    pub compressed_bytes: u64,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct SavedImage {
    pub filename: String,
    pub url: String,
    pub size_info: Option<SizeInfo>,
}

/// One row of a directory listing.
#[derive(Debug, Clone, Serialize)]
pub struct ImageEntry {
    pub filename: String,
    pub url: String,
    pub size: String,
    pub size_bytes: u64,
    pub upload_time: String,
}

/// Stateless image storage service; all durable state lives on the
/// filesystem under the configured upload directory.
pub struct ImageStorage {
    config: StorageConfig,
}

impl ImageStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// True iff `filename` is non-empty and carries an allowed extension,
    /// case-insensitively.
    pub fn validate(&self, filename: &str) -> bool {
        allowed_extension(filename, self.config.allowed_extensions).is_some()
    }

    /// Persists an upload under a generated name and returns its public URL.
    ///
    /// Without compression the bytes are written unchanged. With compression
    /// the image is re-encoded as JPEG (see [`compress_to_jpeg`]), the stored
    /// extension becomes `.jpg`, and [`SizeInfo`] reports both byte counts.
    pub async fn save(
        &self,
        source_name: &str,
        data: Vec<u8>,
        compress: bool,
        quality: Option<u8>,
    ) -> Result<SavedImage, StorageError> {
        let ext = allowed_extension(source_name, self.config.allowed_extensions)
            .ok_or_else(|| StorageError::InvalidExtension(source_name.to_string()))?;

        let original_bytes = data.len() as u64;
        let (bytes, ext, size_info) = if compress {
            let quality = quality.unwrap_or(self.config.jpeg_quality).clamp(1, 100);
            let max_dimension = self.config.max_dimension;
            let jpeg =
                tokio::task::spawn_blocking(move || compress_to_jpeg(&data, max_dimension, quality))
                    .await
                    .map_err(|e| StorageError::Compress(e.to_string()))??;
            let size_info = SizeInfo {
                original_bytes,
                compressed_bytes: jpeg.len() as u64,
            };
            (jpeg, "jpg".to_string(), Some(size_info))
        } else {
            (data, ext, None)
        };

        let filename = generate_filename(&ext);
        let path = self.config.upload_dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {e}", path.display())))?;

        let url = self.url_for(&filename);
        Ok(SavedImage {
            filename,
            url,
            size_info,
        })
    }

    /// Lists stored images, newest first. Files without an allowed extension
    /// are ignored; equal timestamps order by filename.
    pub async fn list(&self) -> Result<Vec<ImageEntry>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.config.upload_dir)
            .await
            .map_err(|e| StorageError::List(e.to_string()))?;

        let mut images = Vec::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::List(e.to_string()))?
        {
            let filename = entry.file_name();
            let Some(filename) = filename.to_str() else {
                continue;
            };
            if allowed_extension(filename, self.config.allowed_extensions).is_none() {
                continue;
            }

            let meta = entry
                .metadata()
                .await
                .map_err(|e| StorageError::List(e.to_string()))?;
            if !meta.is_file() {
                continue;
            }

            // Creation time is unavailable on some filesystems; fall back to
            // the change time.
            let created = meta
                .created()
                .or_else(|_| meta.modified())
                .map_err(|e| StorageError::List(e.to_string()))?;
            let upload_time = DateTime::<Local>::from(created)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string();

            images.push(ImageEntry {
                filename: filename.to_string(),
                url: self.url_for(filename),
                size: human_size(meta.len()),
                size_bytes: meta.len(),
                upload_time,
            });
        }

        sort_newest_first(&mut images);
        Ok(images)
    }

    fn url_for(&self, filename: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.url_prefix, self.config.path_prefix, filename
        )
    }
}

/// Returns the lower-cased extension of `filename` if it is in `allowed`.
fn allowed_extension(filename: &str, allowed: &[&str]) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    allowed.contains(&ext.as_str()).then_some(ext)
}

/// Generates `YYYYMMDD_<token>.<ext>` with an 8-hex-char random token, so
/// repeated uploads of the same source never collide.
fn generate_filename(ext: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}_{}.{ext}", Local::now().format("%Y%m%d"), &token[..8])
}

/// Humanizes a byte count across B/KB/MB/GB/TB with one decimal place.
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

fn sort_newest_first(entries: &mut [ImageEntry]) {
    entries.sort_by(|a, b| {
        b.upload_time
            .cmp(&a.upload_time)
            .then_with(|| a.filename.cmp(&b.filename))
    });
}
