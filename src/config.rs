//! Add-on configuration.
//!
//! The supervisor writes the user's options to `/data/options.json`. They are
//! read once at startup and turned into an immutable [`Configuration`] that is
//! passed by reference to everything that needs it.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::models::{ReferenceRoi, ReferenceSize};
use crate::vision::EngineKind;

/// Default location of the options file inside the add-on container
pub const DEFAULT_OPTIONS_PATH: &str = "/data/options.json";

/// Environment variable holding the supervisor API token
pub const TOKEN_ENV: &str = "SUPERVISOR_TOKEN";

/// Log directives used when `debug` is set and `RUST_LOG` is not
pub const DEBUG_LOG_FILTER: &str = "oilmeter=debug,info";

/// Raw options as stored in `options.json`
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Options {
    pub esp_ip: String,
    /// Seconds between two snapshots
    pub poll_interval: u64,
    pub roi_x: u32,
    pub roi_y: u32,
    pub roi_w: u32,
    pub roi_h: u32,
    pub debug: bool,
    /// Frame size the ROI was measured on
    pub base_width: u32,
    pub base_height: u32,
    pub ocr_engine: EngineKind,
    /// Tesseract language model, e.g. "deu"
    pub ocr_language: Option<String>,
    /// Directory holding the ocrs `.rten` models
    pub model_dir: Option<PathBuf>,
    pub ha_api_url: String,
    pub entity_id: String,
    pub friendly_name: String,
}

impl Default for Options {
    fn default() -> Self {
        let roi = ReferenceRoi::default();
        let reference = ReferenceSize::default();
        Self {
            esp_ip: "192.168.1.45".to_string(),
            poll_interval: 10,
            roi_x: roi.x,
            roi_y: roi.y,
            roi_w: roi.w,
            roi_h: roi.h,
            debug: false,
            base_width: reference.width,
            base_height: reference.height,
            ocr_engine: EngineKind::default(),
            ocr_language: None,
            model_dir: None,
            ha_api_url: "http://supervisor/core/api".to_string(),
            entity_id: "sensor.oilmeter".to_string(),
            friendly_name: "Ölzählerstand".to_string(),
        }
    }
}

/// Read the options file.
///
/// `Ok(None)` when the file is missing or cannot be read. Malformed JSON is an
/// error.
pub fn load_options(path: &Path) -> Result<Option<Options>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return Ok(None);
        }
    };
    let options = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(options))
}

/// Recognition engine settings
#[derive(Clone, Debug, PartialEq)]
pub struct OcrSettings {
    pub engine: EngineKind,
    pub language: Option<String>,
    pub model_dir: Option<PathBuf>,
}

/// Where readings are sent
#[derive(Clone, Debug, PartialEq)]
pub struct PublisherSettings {
    pub api_url: String,
    pub entity_id: String,
    pub friendly_name: String,
    pub token: Option<String>,
}

/// Validated, immutable process configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub camera_address: String,
    pub poll_interval: Duration,
    pub roi: ReferenceRoi,
    pub reference: ReferenceSize,
    pub debug: bool,
    pub ocr: OcrSettings,
    pub publisher: PublisherSettings,
}

impl Configuration {
    /// Validate `options`. `token` is the supervisor bearer credential.
    pub fn from_options(options: Options, token: Option<String>) -> Result<Self> {
        if options.roi_w == 0 || options.roi_h == 0 {
            bail!(
                "ROI must have a non-zero size, got {}x{}",
                options.roi_w,
                options.roi_h
            );
        }
        if options.base_width == 0 || options.base_height == 0 {
            bail!(
                "Reference frame size must be non-zero, got {}x{}",
                options.base_width,
                options.base_height
            );
        }
        if options.poll_interval == 0 {
            bail!("poll_interval must be at least one second");
        }

        Ok(Self {
            camera_address: options.esp_ip,
            poll_interval: Duration::from_secs(options.poll_interval),
            roi: ReferenceRoi::new(options.roi_x, options.roi_y, options.roi_w, options.roi_h),
            reference: ReferenceSize::new(options.base_width, options.base_height),
            debug: options.debug,
            ocr: OcrSettings {
                engine: options.ocr_engine,
                language: options.ocr_language,
                model_dir: options.model_dir,
            },
            publisher: PublisherSettings {
                api_url: options.ha_api_url.trim_end_matches('/').to_string(),
                entity_id: options.entity_id,
                friendly_name: options.friendly_name,
                token: token.filter(|t| !t.is_empty()),
            },
        })
    }

    /// URL of the camera's snapshot endpoint
    pub fn capture_url(&self) -> String {
        format!("http://{}/capture", self.camera_address)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            camera_address: "192.168.1.45".to_string(),
            poll_interval: Duration::from_secs(10),
            roi: ReferenceRoi::default(),
            reference: ReferenceSize::default(),
            debug: false,
            ocr: OcrSettings {
                engine: EngineKind::default(),
                language: None,
                model_dir: None,
            },
            publisher: PublisherSettings {
                api_url: "http://supervisor/core/api".to_string(),
                entity_id: "sensor.oilmeter".to_string(),
                friendly_name: "Ölzählerstand".to_string(),
                token: None,
            },
        }
    }
}
