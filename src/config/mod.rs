mod settings;

pub use settings::{AuthSettings, Config, InvoiceSettings, PdfSettings, Shop};

use crate::error::{HahnemannError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (platform config dir, else ~/.hahnemann/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "hahnemann") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        HahnemannError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".hahnemann"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a configured path: `~` is expanded, relative paths hang off the config dir.
pub fn resolve_path(path: &str, cfg_dir: &Path) -> PathBuf {
    let expanded = expand_path(path);
    if expanded.is_absolute() {
        expanded
    } else {
        cfg_dir.join(expanded)
    }
}

/// Load the main config.toml
pub fn load_config(cfg_dir: &Path) -> Result<Config> {
    if !cfg_dir.exists() {
        return Err(HahnemannError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    let path = cfg_dir.join("config.toml");
    if !path.exists() {
        return Err(HahnemannError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let config: Config =
        toml::from_str(&content).map_err(|e| HahnemannError::ConfigParse { path, source: e })?;
    config.pdf.validate()?;
    Ok(config)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[shop]
name = "The Hahnemann"

[invoice]
title = "The Hahnemann Invoice"
currency_label = "INR"
file_name = "invoice.pdf"

[pdf]
output_dir = "output"          # relative to this directory, or absolute / ~/...
watermark = "watermark.png"    # file path or http(s) URL
watermark_timeout_secs = 5
watermark_opacity = 0.15       # 0.0 (invisible) to 1.0 (opaque)
watermark_x = 30.0             # millimetres from the left edge
watermark_y = 50.0             # millimetres from the top edge
watermark_size = 150.0         # edge length in millimetres

[auth]
# client_id = "1234-abcd.apps.googleusercontent.com"
script_url = "https://accounts.google.com/gsi/client"
"#;
