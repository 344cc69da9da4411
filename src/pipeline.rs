use image::{DynamicImage, GenericImageView, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::error::PipelineError;
use crate::models::{ReadingOutcome, RecognitionResult, ReferenceRoi, ReferenceSize, ResolvedRoi};
use crate::vision::ocr::TextRecognizer;
use crate::vision::{number, preprocessing, roi, steps, text};

/// Debug configuration for stage dumps
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context available to all conditioning steps
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

impl PipelineContext {
    fn dump_dir(&self) -> Option<&PathBuf> {
        match &self.debug {
            Some(config) if config.enabled => Some(&config.output_dir),
            _ => None,
        }
    }

    /// Save the frame with the resolved ROI outlined
    pub fn save_input(&self, image: &DynamicImage, roi: &ResolvedRoi) {
        let Some(dir) = self.dump_dir() else {
            return;
        };

        let mut canvas = image.to_rgb8();
        let rect = Rect::at(roi.x1 as i32, roi.y1 as i32).of_size(roi.width(), roi.height());
        draw_hollow_rect_mut(&mut canvas, rect, Rgb([255u8, 0, 0]));

        let path = dir.join("00_input.png");
        match canvas.save(&path) {
            Ok(()) => debug!("Debug: saved {}", path.display()),
            Err(e) => warn!("Failed to save debug input {}: {}", path.display(), e),
        }
    }

    /// Save the output of one conditioning step as `NN_<step_name>.png`
    pub fn save_stage(&self, step_index: usize, step_name: &str, image: &DynamicImage) {
        let Some(dir) = self.dump_dir() else {
            return;
        };

        let filename = format!(
            "{:02}_{}.png",
            step_index,
            step_name.to_lowercase().replace(' ', "_")
        );
        let path = dir.join(&filename);
        match image.save(&path) {
            Ok(()) => debug!("Debug: saved {}", filename),
            Err(e) => warn!("Failed to save debug image {}: {}", path.display(), e),
        }
    }
}

/// One stage of image conditioning
pub trait ConditioningStep: Send + Sync {
    /// Transform the image handed over by the previous stage
    fn process(&self, image: DynamicImage, context: &PipelineContext) -> Result<DynamicImage, PipelineError>;

    /// Human-readable name for this step (used in logs and dump file names)
    fn name(&self) -> &str;
}

/// Image → reading.
///
/// Stateless between invocations: every call to [`ReadingPipeline::run`] resolves
/// the ROI against the frame it is given, and all intermediate rasters are
/// dropped before it returns.
pub struct ReadingPipeline {
    roi: ReferenceRoi,
    reference: ReferenceSize,
    log_frames: bool,
    steps: Vec<Arc<dyn ConditioningStep>>,
    recognizer: Box<dyn TextRecognizer>,
    context: PipelineContext,
}

impl ReadingPipeline {
    pub fn new(config: &Configuration, recognizer: Box<dyn TextRecognizer>) -> Self {
        Self {
            roi: config.roi,
            reference: config.reference,
            log_frames: config.debug,
            steps: steps::standard_steps(),
            recognizer,
            context: PipelineContext::default(),
        }
    }

    /// Replace the conditioning stages
    pub fn with_steps(mut self, steps: Vec<Arc<dyn ConditioningStep>>) -> Self {
        self.steps = steps;
        self
    }

    /// Enable stage dumps into `output_dir`.
    /// The directory must be empty or non-existent.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Run one full pass over `image`. Never panics on bad input; every fault
    /// ends up in [`ReadingOutcome::Failed`].
    pub fn run(&self, image: &DynamicImage) -> ReadingOutcome {
        let (width, height) = image.dimensions();

        let resolved = match roi::resolve(width, height, &self.roi, &self.reference) {
            Ok(resolved) => resolved,
            Err(error) => return ReadingOutcome::Failed { raw_text: None, error },
        };

        if self.log_frames {
            info!(
                "Frame {}x{} ({:?}), ROI {}",
                width,
                height,
                image.color(),
                resolved
            );
        }
        self.context.save_input(image, &resolved);

        let conditioned = match steps::run_steps(&self.steps, image, &resolved, &self.context) {
            Ok(conditioned) => conditioned,
            Err(error) => return ReadingOutcome::Failed { raw_text: None, error },
        };

        if !preprocessing::has_ink(&conditioned) {
            return ReadingOutcome::Failed {
                raw_text: None,
                error: PipelineError::BlankRegion,
            };
        }

        let raw = match self.recognizer.recognize(&conditioned) {
            Ok(raw) => raw,
            Err(e) => {
                return ReadingOutcome::Failed {
                    raw_text: Some(String::new()),
                    error: PipelineError::Recognition {
                        engine: self.recognizer.name().to_string(),
                        message: format!("{:#}", e),
                    },
                };
            }
        };
        drop(conditioned);

        let raw_text = text::normalize(&raw);
        if self.log_frames {
            info!("OCR raw text: {:?} -> {:?}", raw, raw_text);
        }

        let numeric_value = match number::find_number(&raw_text) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("No reading: {}", e);
                None
            }
        };

        ReadingOutcome::Done(RecognitionResult {
            raw_text,
            numeric_value,
        })
    }
}
