//! Gzip codec backed by `flate2`
//!
//! `flate2` is synchronous, so every call runs on the blocking pool.

use super::{keep_if_smaller, sibling_path, Compressor};
use crate::domain::{ExporterError, Result};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

fn gzip_file(source: &Path, target: &Path, level: Compression) -> std::io::Result<()> {
    let mut reader = BufReader::new(File::open(source)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(target)?), level);
    std::io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()?;
    Ok(())
}

#[async_trait]
impl Compressor for GzipCompressor {
    fn extension(&self) -> &str {
        "gz"
    }

    async fn compress(&self, path: &Path) -> Result<PathBuf> {
        let source = path.to_path_buf();
        let target = sibling_path(path, self.extension());
        let level = self.level;

        let chosen = tokio::task::spawn_blocking(move || {
            if let Err(e) = gzip_file(&source, &target, level) {
                let _ = std::fs::remove_file(&target);
                return Err(e);
            }
            keep_if_smaller(&source, &target)
        })
        .await
        .map_err(|e| ExporterError::Compression(format!("Compression task failed: {e}")))?
        .map_err(|e| {
            ExporterError::Compression(format!("Failed to compress {}: {}", path.display(), e))
        })?;

        if chosen.as_path() == path {
            tracing::debug!(file = %path.display(), "Compressed artifact not smaller, keeping original");
        }
        Ok(chosen)
    }
}

/// Gunzips `source` into `target`, returning the decompressed byte count
pub async fn decompress_file(source: &Path, target: &Path) -> Result<u64> {
    let source = source.to_path_buf();
    let target = target.to_path_buf();
    let display = source.display().to_string();

    tokio::task::spawn_blocking(move || -> std::io::Result<u64> {
        let mut decoder = GzDecoder::new(BufReader::new(File::open(&source)?));
        let mut writer = BufWriter::new(File::create(&target)?);
        let written = std::io::copy(&mut decoder, &mut writer)?;
        writer.flush()?;
        Ok(written)
    })
    .await
    .map_err(|e| ExporterError::Compression(format!("Decompression task failed: {e}")))?
    .map_err(|e| ExporterError::Compression(format!("Failed to decompress {display}: {e}")))
}
