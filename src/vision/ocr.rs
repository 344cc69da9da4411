use anyhow::{anyhow, bail, Context, Result};
use image::{DynamicImage, GrayImage};
pub use ocrs::{ImageSource, OcrEngine};
use ocrs::OcrEngineParams;
use rten::Model;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use crate::config::OcrSettings;
use crate::vision::preprocessing;

/// Characters the display can show
pub const DIGIT_WHITELIST: &str = "0123456789.,";

/// Tesseract page segmentation mode "treat the image as a single text line"
const TESSERACT_SINGLE_LINE: &str = "7";

/// Turns a conditioned (binary, ink = white) image into text.
///
/// Implementations restrict output to [`DIGIT_WHITELIST`] where the engine
/// supports it and read the image as a single line.
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;
    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Ocrs,
    Tesseract,
}

/// Build the recognizer selected in the options file
pub fn build_recognizer(settings: &OcrSettings) -> Result<Box<dyn TextRecognizer>> {
    match settings.engine {
        EngineKind::Ocrs => {
            let dir = match &settings.model_dir {
                Some(dir) => dir.clone(),
                None => default_model_dir()?,
            };
            Ok(Box::new(OcrsRecognizer::from_model_dir(&dir)?))
        }
        EngineKind::Tesseract => Ok(Box::new(TesseractRecognizer::new(settings.language.clone())?)),
    }
}

/// Standard cache location used by `ocrs-cli`
pub fn default_model_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Neural OCR via `ocrs`
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    pub fn from_model_dir(model_dir: &Path) -> Result<Self> {
        let detection_model_path = model_dir.join("text-detection.rten");
        let recognition_model_path = model_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            bail!(
                "OCR models not found. Please run: ocrs-cli --help (or download models manually)\n\
                 Expected locations:\n  - {}\n  - {}",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            allowed_chars: Some(DIGIT_WHITELIST.to_string()),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String> {
        // The models are trained on dark glyphs over light paper
        let paper = preprocessing::invert(image);
        let img = DynamicImage::ImageLuma8(paper).to_rgb8();

        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| anyhow!("invalid OCR input: {:?}", e))?;
        let ocr_input = self.engine.prepare_input(img_source)?;

        let words = self.engine.detect_words(&ocr_input)?;
        if words.is_empty() {
            return Ok(String::new());
        }

        // Single-line mode: the counter shows one row, so every word joins one line
        let line: Vec<_> = self
            .engine
            .find_text_lines(&ocr_input, &words)
            .into_iter()
            .flatten()
            .collect();
        let lines = self.engine.recognize_text(&ocr_input, &[line])?;

        Ok(lines
            .into_iter()
            .flatten()
            .map(|line| line.to_string())
            .collect::<Vec<_>>()
            .join(""))
    }
}

/// Tesseract command-line engine
pub struct TesseractRecognizer {
    executable: PathBuf,
    language: Option<String>,
}

impl TesseractRecognizer {
    /// Locate `tesseract` on PATH (or `TESSERACT_PATH`)
    pub fn new(language: Option<String>) -> Result<Self> {
        let executable = std::env::var_os("TESSERACT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tesseract"));

        let output = Command::new(&executable)
            .arg("--version")
            .output()
            .with_context(|| format!("Tesseract not found at {}", executable.display()))?;
        if !output.status.success() {
            bail!("{} --version exited with {}", executable.display(), output.status);
        }

        Ok(Self::with_executable(executable, language))
    }

    pub fn with_executable(executable: PathBuf, language: Option<String>) -> Self {
        Self { executable, language }
    }

    /// Arguments for reading `input` to stdout
    pub fn command_args(&self, input: &Path) -> Vec<String> {
        let mut args = vec![
            input.to_string_lossy().to_string(),
            "stdout".to_string(),
            "--psm".to_string(),
            TESSERACT_SINGLE_LINE.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", DIGIT_WHITELIST),
        ];
        if let Some(language) = &self.language {
            args.push("-l".to_string());
            args.push(language.clone());
        }
        args
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        image.save(temp_input.path())?;

        let output = Command::new(&self.executable)
            .args(self.command_args(temp_input.path()))
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Tesseract failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
