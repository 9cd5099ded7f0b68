//! Stand-in for the external resize pipeline: writes the standard WebP
//! rendition of every original that does not have one yet.
//!
//! The gallery never waits on this. Records point at the predicted rendition
//! path from the start and fall back to the original until it appears.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gallery::paths::{self, STANDARD_DIMENSION, UPLOAD_PREFIX};
use crate::storage::{DynObjectStore, StorageError};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeriveConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default = "default_webp_quality")]
    pub webp_quality: f32,
}

fn default_interval_minutes() -> u64 {
    10
}

fn default_webp_quality() -> f32 {
    80.0
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_interval_minutes(),
            webp_quality: default_webp_quality(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Encoding task failed: {0}")]
    Task(String),
}

#[derive(Debug, Default, Serialize)]
pub struct DeriveReport {
    pub scanned: usize,
    pub already_present: usize,
    pub generated: Vec<String>,
    pub failed: Vec<String>,
}

pub struct DerivedAssetPipeline {
    objects: DynObjectStore,
    config: DeriveConfig,
}

impl DerivedAssetPipeline {
    pub fn new(objects: DynObjectStore, config: DeriveConfig) -> Self {
        Self { objects, config }
    }

    /// One pass over the upload prefix. Per-file failures are reported, not returned.
    pub async fn run_once(&self) -> Result<DeriveReport, DeriveError> {
        let listed = self.objects.list(UPLOAD_PREFIX).await?;
        let mut report = DeriveReport {
            scanned: listed.len(),
            ..Default::default()
        };

        for blob in listed {
            let predicted = paths::predict_from_original(&blob.path);
            if self.objects.resolve_url(&predicted.standard_path).await.is_ok() {
                report.already_present += 1;
                continue;
            }

            match self.derive_one(&blob.path, &predicted.standard_path).await {
                Ok(()) => {
                    info!("Derived {} -> {}", blob.path, predicted.standard_path);
                    report.generated.push(predicted.standard_path);
                }
                Err(e) => {
                    warn!("Could not derive rendition for {}: {}", blob.path, e);
                    report.failed.push(blob.path);
                }
            }
        }

        debug!(
            "Derive pass: {} scanned, {} present, {} generated, {} failed",
            report.scanned,
            report.already_present,
            report.generated.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn derive_one(&self, original: &str, target: &str) -> Result<(), DeriveError> {
        let bytes = self.objects.download(original).await?;
        let quality = self.config.webp_quality;

        let encoded = tokio::task::spawn_blocking(move || {
            encode_standard(&bytes, STANDARD_DIMENSION, quality)
        })
        .await
        .map_err(|e| DeriveError::Task(e.to_string()))??;

        self.objects.upload(target, encoded).await?;
        Ok(())
    }

    pub fn start_background(self: Arc<Self>) -> JoinHandle<()> {
        let interval_minutes = self.config.interval_minutes.max(1);
        info!("Derived asset pipeline runs every {} minutes", interval_minutes);

        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_minutes * 60));

            loop {
                interval.tick().await;
                if let Err(e) = self.run_once().await {
                    error!("Derived asset pass failed: {}", e);
                }
            }
        })
    }
}

/// Decodes an original, fits it into `max_dimension` square without
/// upscaling, and encodes it as WebP.
pub fn encode_standard(
    bytes: &[u8],
    max_dimension: u32,
    quality: f32,
) -> Result<Vec<u8>, DeriveError> {
    let img = image::load_from_memory(bytes)?;

    let img = if img.width() > max_dimension || img.height() > max_dimension {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let encoded = webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode(quality);
    Ok(encoded.to_vec())
}
