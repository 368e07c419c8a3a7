//! Loading the background image stamped onto exported invoices.
//!
//! The load runs on a worker thread and the caller waits at most the
//! configured timeout for it. A slow or broken source therefore always ends
//! in a `WatermarkLoad` or `WatermarkTimeout` error, never in a hang.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::config::resolve_path;
use crate::error::{HahnemannError, Result};
use crate::layout::Raster;

const MAX_REMOTE_BYTES: u64 = 20 * 1024 * 1024;

/// Extra time the HTTP agent gets beyond the caller's wait, so the caller's
/// `recv_timeout` is always the limit that fires first.
const AGENT_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub enum WatermarkSource {
    File(PathBuf),
    Url(String),
}

impl WatermarkSource {
    /// Interpret a configured `watermark` value. Relative paths hang off `cfg_dir`.
    pub fn from_setting(value: &str, cfg_dir: &Path) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            WatermarkSource::Url(value.to_string())
        } else {
            WatermarkSource::File(resolve_path(value, cfg_dir))
        }
    }

    fn fetch(&self, timeout: Duration) -> std::result::Result<Vec<u8>, String> {
        match self {
            WatermarkSource::File(path) => std::fs::read(path).map_err(|e| e.to_string()),
            WatermarkSource::Url(url) => fetch_url(url, timeout),
        }
    }
}

impl fmt::Display for WatermarkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatermarkSource::File(path) => write!(f, "{}", path.display()),
            WatermarkSource::Url(url) => f.write_str(url),
        }
    }
}

fn fetch_url(url: &str, timeout: Duration) -> std::result::Result<Vec<u8>, String> {
    use ureq::Agent;

    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(timeout + AGENT_GRACE))
        .build()
        .into();

    let mut response = agent.get(url).call().map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    response
        .body_mut()
        .as_reader()
        .take(MAX_REMOTE_BYTES)
        .read_to_end(&mut bytes)
        .map_err(|e| e.to_string())?;
    Ok(bytes)
}

/// Load and decode the watermark, waiting at most `timeout`.
///
/// The result is flattened onto white at `opacity` so it prints as a faint
/// background regardless of the source's own alpha channel.
pub fn load(source: &WatermarkSource, timeout: Duration, opacity: f32) -> Result<Raster> {
    let (tx, rx) = mpsc::channel();
    let worker_source = source.clone();

    thread::spawn(move || {
        let decoded = worker_source.fetch(timeout).and_then(|bytes| {
            image::load_from_memory(&bytes).map_err(|e| format!("cannot decode image: {e}"))
        });
        // The receiver is gone if the caller already timed out.
        let _ = tx.send(decoded);
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(image)) => {
            debug!(source = %source, width = image.width(), height = image.height(), "watermark loaded");
            Ok(flatten(&image, opacity))
        }
        Ok(Err(reason)) => {
            warn!(source = %source, %reason, "watermark failed to load");
            Err(HahnemannError::WatermarkLoad {
                source_name: source.to_string(),
                reason,
            })
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!(source = %source, secs = timeout.as_secs(), "watermark load timed out");
            Err(HahnemannError::WatermarkTimeout {
                source_name: source.to_string(),
                secs: timeout.as_secs(),
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(HahnemannError::WatermarkLoad {
            source_name: source.to_string(),
            reason: "loader stopped unexpectedly".to_string(),
        }),
    }
}

/// Composite `image` over white, scaling its alpha by `opacity`.
pub fn flatten(image: &DynamicImage, opacity: f32) -> Raster {
    let opacity = opacity.clamp(0.0, 1.0);
    let rgba = image.to_rgba8();
    let (width_px, height_px) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width_px * height_px * 3) as usize);
    for pixel in rgba.pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0 * opacity;
        for channel in [r, g, b] {
            let blended = channel as f32 * alpha + 255.0 * (1.0 - alpha);
            rgb.push(blended.round() as u8);
        }
    }

    Raster {
        width_px,
        height_px,
        rgb,
    }
}

/// Draw the stock watermark: a green pharmacy cross on a transparent square.
pub fn default_image(size: u32) -> RgbaImage {
    let arm = size / 3;
    let (lo, hi) = (arm, size - arm);
    RgbaImage::from_fn(size, size, |x, y| {
        let on_cross = (lo..hi).contains(&x) || (lo..hi).contains(&y);
        if on_cross {
            Rgba([22, 128, 61, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Write the stock watermark as a PNG at `path`.
pub fn write_default(path: &Path) -> Result<()> {
    default_image(512)
        .save(path)
        .map_err(|source| HahnemannError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })
}
