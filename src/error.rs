//! Fault taxonomy of the reading pipeline.

use std::num::ParseFloatError;
use thiserror::Error;

/// A step of the pipeline that ended the invocation early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("region of interest is empty after clamping to {width}x{height}")]
    EmptyRegion { width: u32, height: u32 },

    #[error("conditioned region carries no ink")]
    BlankRegion,

    #[error("conditioning failed at {step}: {message}")]
    Conditioning { step: String, message: String },

    #[error("recognition failed in {engine}: {message}")]
    Recognition { engine: String, message: String },
}

impl PipelineError {
    /// Faults that describe the scene rather than a broken component.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            PipelineError::EmptyRegion { .. } | PipelineError::BlankRegion
        )
    }
}

/// Why no number came out of the normalized text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no numeric pattern in {text:?}")]
    NoNumericMatch { text: String },

    #[error("could not parse {candidate:?} as a number")]
    ParseFault {
        candidate: String,
        #[source]
        source: ParseFloatError,
    },
}
