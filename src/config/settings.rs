use serde::{Deserialize, Serialize};

use crate::error::{HahnemannError, Result};

#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    pub shop: Shop,
    pub invoice: InvoiceSettings,
    pub pdf: PdfSettings,
    pub auth: AuthSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Shop {
    pub name: String,
}

impl Default for Shop {
    fn default() -> Self {
        Self {
            name: "The Hahnemann".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct InvoiceSettings {
    pub title: String,
    pub currency_label: String,
    pub file_name: String,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            title: "The Hahnemann Invoice".to_string(),
            currency_label: "INR".to_string(),
            file_name: "invoice.pdf".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PdfSettings {
    pub output_dir: String,
    /// File path (relative to the config directory) or http(s) URL.
    pub watermark: String,
    pub watermark_timeout_secs: u64,
    pub watermark_opacity: f32,
    /// Top-left corner and edge length of the watermark, in millimetres.
    pub watermark_x: f32,
    pub watermark_y: f32,
    pub watermark_size: f32,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            watermark: "watermark.png".to_string(),
            watermark_timeout_secs: 5,
            watermark_opacity: 0.15,
            watermark_x: 30.0,
            watermark_y: 50.0,
            watermark_size: 150.0,
        }
    }
}

impl PdfSettings {
    /// Reject values the renderer or the watermark loader cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &'static str, reason: &str| -> Result<()> {
            Err(HahnemannError::InvalidSetting {
                key,
                reason: reason.to_string(),
            })
        };

        if self.watermark_timeout_secs == 0 {
            return invalid("watermark_timeout_secs", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.watermark_opacity) {
            return invalid("watermark_opacity", "must be between 0.0 and 1.0");
        }
        if !self.watermark_size.is_finite() || self.watermark_size <= 0.0 {
            return invalid("watermark_size", "must be a positive number of millimetres");
        }
        if !self.watermark_x.is_finite() {
            return invalid("watermark_x", "must be a finite number");
        }
        if !self.watermark_y.is_finite() {
            return invalid("watermark_y", "must be a finite number");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AuthSettings {
    pub client_id: Option<String>,
    pub script_url: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            script_url: "https://accounts.google.com/gsi/client".to_string(),
        }
    }
}
