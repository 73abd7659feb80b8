//! Turning results into downloadable files.
//!
//! # Naming
//!
//! - single result: `<brand>-art-<id>.png`
//! - archive: `<brand>-<suffix>.zip`, entries `<brand>-<suffix>-<n>.png`
//!   numbered from 1 in slot order
//!
//! A blank suffix falls back to [`DEFAULT_SUFFIX`].

use crate::compositor::Compositor;
use crate::error::{AppError, Result};
use crate::model::ThumbnailResult;
use crate::ops::{bounded_blocking, CancelToken};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DEFAULT_SUFFIX: &str = "pack";

pub fn resolve_suffix(input: &str) -> &str {
    match input.trim() {
        "" => DEFAULT_SUFFIX,
        s => s,
    }
}

pub fn single_file_name(brand: &str, result: &ThumbnailResult) -> String {
    format!("{brand}-art-{}.png", result.id)
}

pub fn archive_name(brand: &str, suffix: &str) -> String {
    format!("{brand}-{}.zip", resolve_suffix(suffix))
}

/// Entry name for the result at 0-based `index`.
pub fn archive_entry_name(brand: &str, suffix: &str, index: usize) -> String {
    format!("{brand}-{}-{}.png", resolve_suffix(suffix), index + 1)
}

/// A finished download: only ever built once every byte is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Writes the file into `dir`, creating the directory if needed.
    pub fn write_into(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "saved");
        Ok(path)
    }
}

pub struct Exporter {
    compositor: Compositor,
    brand: String,
    render_timeout: Duration,
}

impl Exporter {
    pub fn new(compositor: Compositor, brand: impl Into<String>, render_timeout: Duration) -> Self {
        Self {
            compositor,
            brand: brand.into(),
            render_timeout,
        }
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    /// Decodes and composites off the async threads, bounded by the decode timeout.
    async fn render(&self, result: &ThumbnailResult, cancel: &CancelToken) -> Result<Vec<u8>> {
        let compositor = self.compositor.clone();
        let snapshot = result.clone();
        bounded_blocking("render", self.render_timeout, cancel, move || {
            compositor.render_png(&snapshot)
        })
        .await
    }

    #[instrument(skip_all, fields(id = %result.id))]
    pub async fn export_one(
        &self,
        result: &ThumbnailResult,
        cancel: &CancelToken,
    ) -> Result<ExportedFile> {
        let bytes = match self.render(result, cancel).await {
            Ok(bytes) => bytes,
            Err(AppError::Cancelled(op)) => return Err(AppError::Cancelled(op)),
            Err(e) => {
                warn!(error = %e, "render failed");
                return Err(AppError::export(e.to_string()));
            }
        };
        Ok(ExportedFile {
            name: single_file_name(&self.brand, result),
            bytes,
        })
    }

    /// Builds one archive with every result, one composite at a time.
    ///
    /// Any failure aborts the whole archive; no partial file is returned.
    #[instrument(skip_all, fields(count = results.len(), suffix = resolve_suffix(suffix)))]
    pub async fn export_all(
        &self,
        results: &[ThumbnailResult],
        suffix: &str,
        cancel: &CancelToken,
    ) -> Result<ExportedFile> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (index, result) in results.iter().enumerate() {
            let png = match self.render(result, cancel).await {
                Ok(png) => png,
                Err(AppError::Cancelled(op)) => return Err(AppError::Cancelled(op)),
                Err(e) => {
                    warn!(index, error = %e, "archive entry failed");
                    return Err(AppError::export(format!("image {} of {}: {}", index + 1, results.len(), e)));
                }
            };

            let entry = archive_entry_name(&self.brand, suffix, index);
            zip.start_file(entry, options)
                .map_err(|e| AppError::export(format!("zip entry: {e}")))?;
            zip.write_all(&png)
                .map_err(|e| AppError::export(format!("zip write: {e}")))?;
        }

        let bytes = zip
            .finish()
            .map_err(|e| AppError::export(format!("zip finish: {e}")))?
            .into_inner();

        info!(bytes = bytes.len(), "archive ready");
        Ok(ExportedFile {
            name: archive_name(&self.brand, suffix),
            bytes,
        })
    }
}
