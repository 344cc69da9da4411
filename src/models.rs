use crate::error::PipelineError;

/// Frame size the ROI was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSize {
    pub width: u32,
    pub height: u32,
}

impl ReferenceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ReferenceSize {
    fn default() -> Self {
        // Snapshot size of the ESP32-CAM frame the default ROI was picked on
        Self::new(883, 783)
    }
}

/// Digit window in reference-frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceRoi {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl ReferenceRoi {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

impl Default for ReferenceRoi {
    fn default() -> Self {
        Self::new(180, 362, 293, 73)
    }
}

/// Pixel rectangle on an actual frame, half-open on the right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRoi {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl ResolvedRoi {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

impl std::fmt::Display for ResolvedRoi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})..({}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

/// What a single pipeline pass read off the display.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    /// Normalized OCR output, possibly empty
    pub raw_text: String,
    /// Set only when a decimal pattern was found and parsed
    pub numeric_value: Option<f64>,
}

/// Terminal state of one pipeline invocation.
#[derive(Debug)]
pub enum ReadingOutcome {
    /// The pipeline ran to completion. The value may still be absent.
    Done(RecognitionResult),
    /// A step failed. `raw_text` holds whatever text was produced before the fault.
    Failed {
        raw_text: Option<String>,
        error: PipelineError,
    },
}

impl ReadingOutcome {
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            ReadingOutcome::Done(result) => result.numeric_value,
            ReadingOutcome::Failed { .. } => None,
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        match self {
            ReadingOutcome::Done(result) => Some(result.raw_text.as_str()),
            ReadingOutcome::Failed { raw_text, .. } => raw_text.as_deref(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ReadingOutcome::Failed { .. })
    }
}
