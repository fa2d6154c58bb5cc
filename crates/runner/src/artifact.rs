//! Artifact storage and baseline comparison
//!
//! Screenshots land in an [`ArtifactStore`] as content-addressed PNGs. The
//! [`BaselineComparer`] diffs an artifact against its stored baseline pixel
//! by pixel, writing a red-marked diff image when they disagree.

use image::{GenericImageView, Pixel, RgbaImage};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use webproof_flow::{ArtifactRecord, FlowError, FlowResult};

/// Writes run artifacts under a root directory
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> FlowResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write PNG bytes, returning a content-addressed record.
    ///
    /// Relative paths resolve under the store root; absolute paths are
    /// honored as given.
    pub fn write(&self, path: &Path, bytes: &[u8]) -> FlowResult<ArtifactRecord> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if let Some(parent) = resolved.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&resolved, bytes).map_err(|e| FlowError::Artifact {
            path: resolved.clone(),
            reason: e.to_string(),
        })?;

        let name = resolved
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let record = ArtifactRecord {
            name,
            path: resolved,
            sha256: hash_bytes(bytes),
            bytes: bytes.len() as u64,
        };
        debug!(path = %record.path.display(), sha256 = %record.sha256, "artifact written");
        Ok(record)
    }
}

/// SHA-256 of a byte slice, hex encoded
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a file's contents, hex encoded
pub fn hash_file(path: &Path) -> FlowResult<String> {
    let data = std::fs::read(path)?;
    Ok(hash_bytes(&data))
}

/// Result of comparing an artifact against its baseline
#[derive(Debug, Clone)]
pub struct BaselineDiff {
    /// Whether the images match within the threshold
    pub matches: bool,

    /// Percentage of pixels that differ
    pub diff_percent: f64,

    /// Number of differing pixels
    pub diff_pixels: u64,

    /// Total pixels compared
    pub total_pixels: u64,

    /// Diff image, present when any pixels differed
    pub diff_image_path: Option<PathBuf>,

    /// Hash of the compared artifact
    pub actual_hash: String,

    /// Hash of the baseline
    pub baseline_hash: String,
}

/// Configuration for baseline comparison
#[derive(Debug, Clone)]
pub struct BaselineOptions {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,
    /// Allowed pixel difference, 0.0 - 100.0 percent
    pub threshold: f64,
}

impl Default for BaselineOptions {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            actual_dir: PathBuf::from("test-results/artifacts"),
            diff_dir: PathBuf::from("test-results/diffs"),
            threshold: 0.5,
        }
    }
}

/// Compares artifacts against stored baselines
pub struct BaselineComparer {
    options: BaselineOptions,
}

impl BaselineComparer {
    pub fn new(options: BaselineOptions) -> FlowResult<Self> {
        std::fs::create_dir_all(&options.baseline_dir)?;
        std::fs::create_dir_all(&options.diff_dir)?;
        Ok(Self { options })
    }

    /// Compare the named artifact against its baseline
    pub fn compare(&self, name: &str, threshold: Option<f64>) -> FlowResult<BaselineDiff> {
        let threshold = threshold.unwrap_or(self.options.threshold);

        let actual_path = self.options.actual_dir.join(format!("{name}.png"));
        let baseline_path = self.options.baseline_dir.join(format!("{name}.png"));

        if !actual_path.exists() {
            return Err(FlowError::Artifact {
                path: actual_path,
                reason: "artifact not found".to_string(),
            });
        }
        if !baseline_path.exists() {
            return Err(FlowError::BaselineMissing(
                baseline_path.to_string_lossy().to_string(),
            ));
        }

        let actual_hash = hash_file(&actual_path)?;
        let baseline_hash = hash_file(&baseline_path)?;
        if actual_hash == baseline_hash {
            debug!(name, "artifact matches baseline exactly");
            let img = open_image(&actual_path)?;
            return Ok(BaselineDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: u64::from(img.width()) * u64::from(img.height()),
                diff_image_path: None,
                actual_hash,
                baseline_hash,
            });
        }

        let actual_img = open_image(&actual_path)?;
        let baseline_img = open_image(&baseline_path)?;

        if actual_img.dimensions() != baseline_img.dimensions() {
            warn!(
                "artifact dimensions differ: actual {:?} vs baseline {:?}",
                actual_img.dimensions(),
                baseline_img.dimensions()
            );
            // overlapping region still gets compared
        }

        let (width, height) = actual_img.dimensions();
        let actual_rgba = actual_img.to_rgba8();
        let baseline_rgba = baseline_img.to_rgba8();

        let mut diff_img = RgbaImage::new(width, height);
        let mut diff_pixels = 0u64;
        let total_pixels = u64::from(width) * u64::from(height);

        for y in 0..height.min(baseline_img.height()) {
            for x in 0..width.min(baseline_img.width()) {
                let actual_pixel = actual_rgba.get_pixel(x, y);
                let baseline_pixel = baseline_rgba.get_pixel(x, y);

                if pixels_differ(actual_pixel, baseline_pixel) {
                    diff_pixels += 1;
                    diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
                } else {
                    // keep the original but dimmed, so diffs stand out
                    let channels = actual_pixel.channels();
                    diff_img.put_pixel(
                        x,
                        y,
                        image::Rgba([channels[0] / 2, channels[1] / 2, channels[2] / 2, 128]),
                    );
                }
            }
        }

        let diff_percent = (diff_pixels as f64 / total_pixels as f64) * 100.0;
        let matches = diff_percent <= threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.options.diff_dir.join(format!("{name}-diff.png"));
            diff_img.save(&path).map_err(|e| FlowError::Artifact {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "baseline mismatch in '{}': {:.2}% pixels differ (threshold {:.2}%)",
                name, diff_percent, threshold
            );
        }

        Ok(BaselineDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
            actual_hash,
            baseline_hash,
        })
    }

    /// Promote the named artifact to be the new baseline
    pub fn update_baseline(&self, name: &str) -> FlowResult<()> {
        let actual_path = self.options.actual_dir.join(format!("{name}.png"));
        let baseline_path = self.options.baseline_dir.join(format!("{name}.png"));

        if !actual_path.exists() {
            return Err(FlowError::Artifact {
                path: actual_path,
                reason: "cannot update baseline, artifact not found".to_string(),
            });
        }

        std::fs::copy(&actual_path, &baseline_path)?;
        info!("updated baseline for '{name}'");
        Ok(())
    }

    /// Names of all stored baselines
    pub fn list_baselines(&self) -> FlowResult<Vec<String>> {
        let mut baselines = Vec::new();
        for entry in std::fs::read_dir(&self.options.baseline_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "png").unwrap_or(false) {
                if let Some(name) = path.file_stem() {
                    baselines.push(name.to_string_lossy().to_string());
                }
            }
        }
        baselines.sort();
        Ok(baselines)
    }
}

fn open_image(path: &Path) -> FlowResult<image::DynamicImage> {
    image::open(path).map_err(|e| FlowError::Artifact {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Whether two pixels differ beyond anti-aliasing noise
fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    const TOLERANCE: i32 = 5;

    let a_channels = a.channels();
    let b_channels = b.channels();
    for i in 0..4 {
        let diff = (i32::from(a_channels[i]) - i32::from(b_channels[i])).abs();
        if diff > TOLERANCE {
            return true;
        }
    }
    false
}
