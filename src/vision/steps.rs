use crate::error::PipelineError;
use crate::models::ResolvedRoi;
use crate::pipeline::{ConditioningStep, PipelineContext};
use crate::vision::preprocessing;
use image::{DynamicImage, GenericImageView, GrayImage};
use std::sync::Arc;

/// Convert the crop to BT.601 grayscale
pub struct GrayscaleStep;

impl ConditioningStep for GrayscaleStep {
    fn process(&self, image: DynamicImage, _context: &PipelineContext) -> Result<DynamicImage, PipelineError> {
        ensure_not_empty(&image, self.name())?;
        Ok(DynamicImage::ImageLuma8(preprocessing::to_grayscale(&image)))
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Suppress sensor noise while keeping digit edges sharp
pub struct BilateralFilterStep {
    pub diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for BilateralFilterStep {
    fn default() -> Self {
        Self {
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

impl ConditioningStep for BilateralFilterStep {
    fn process(&self, image: DynamicImage, _context: &PipelineContext) -> Result<DynamicImage, PipelineError> {
        ensure_not_empty(&image, self.name())?;
        let gray = into_luma8(image);
        let filtered = preprocessing::bilateral_filter(&gray, self.diameter, self.sigma_color, self.sigma_space);
        Ok(DynamicImage::ImageLuma8(filtered))
    }

    fn name(&self) -> &str {
        "Bilateral Filter"
    }
}

/// Gaussian adaptive threshold, ink = white
pub struct AdaptiveThresholdStep {
    pub block_size: u32,
    pub offset: f64,
}

impl Default for AdaptiveThresholdStep {
    fn default() -> Self {
        Self {
            block_size: 11,
            offset: 2.0,
        }
    }
}

impl ConditioningStep for AdaptiveThresholdStep {
    fn process(&self, image: DynamicImage, _context: &PipelineContext) -> Result<DynamicImage, PipelineError> {
        ensure_not_empty(&image, self.name())?;
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(PipelineError::Conditioning {
                step: self.name().to_string(),
                message: format!("block size must be odd and at least 3, got {}", self.block_size),
            });
        }
        let gray = into_luma8(image);
        let binary = preprocessing::adaptive_threshold_inv(&gray, self.block_size, self.offset);
        Ok(DynamicImage::ImageLuma8(binary))
    }

    fn name(&self) -> &str {
        "Adaptive Threshold"
    }
}

/// Reconnect digit strokes broken by thresholding
pub struct DilateStep {
    pub iterations: u32,
}

impl Default for DilateStep {
    fn default() -> Self {
        Self { iterations: 1 }
    }
}

impl ConditioningStep for DilateStep {
    fn process(&self, image: DynamicImage, _context: &PipelineContext) -> Result<DynamicImage, PipelineError> {
        ensure_not_empty(&image, self.name())?;
        let mut binary = into_luma8(image);
        for _ in 0..self.iterations {
            binary = preprocessing::dilate_2x2(&binary);
        }
        Ok(DynamicImage::ImageLuma8(binary))
    }

    fn name(&self) -> &str {
        "Dilate"
    }
}

/// Conditioning stages tuned for the counter wheels
pub fn standard_steps() -> Vec<Arc<dyn ConditioningStep>> {
    vec![
        Arc::new(GrayscaleStep),
        Arc::new(BilateralFilterStep::default()),
        Arc::new(AdaptiveThresholdStep::default()),
        Arc::new(DilateStep::default()),
    ]
}

/// Crop `image` to `roi` and run the standard stages over it
pub fn condition(image: &DynamicImage, roi: &ResolvedRoi) -> Result<GrayImage, PipelineError> {
    let context = PipelineContext::default();
    run_steps(&standard_steps(), image, roi, &context)
}

pub(crate) fn run_steps(
    steps: &[Arc<dyn ConditioningStep>],
    image: &DynamicImage,
    roi: &ResolvedRoi,
    context: &PipelineContext,
) -> Result<GrayImage, PipelineError> {
    let (width, height) = image.dimensions();
    if roi.area() == 0 || roi.x2 > width || roi.y2 > height {
        return Err(PipelineError::EmptyRegion { width, height });
    }

    let mut stage = preprocessing::crop(image, roi);
    for (idx, step) in steps.iter().enumerate() {
        stage = step.process(stage, context)?;
        context.save_stage(idx + 1, step.name(), &stage);
    }
    Ok(into_luma8(stage))
}

fn into_luma8(image: DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray,
        other => preprocessing::to_grayscale(&other),
    }
}

fn ensure_not_empty(image: &DynamicImage, step: &str) -> Result<(), PipelineError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::Conditioning {
            step: step.to_string(),
            message: format!("input has no pixels ({}x{})", image.width(), image.height()),
        });
    }
    Ok(())
}
