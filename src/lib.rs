pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod poller;
pub mod publish;
pub mod source;
pub mod vision;

pub use config::{Configuration, Options};
pub use error::{ExtractError, PipelineError};
pub use models::{ReadingOutcome, RecognitionResult, ReferenceRoi, ReferenceSize, ResolvedRoi};
pub use pipeline::{ConditioningStep, DebugConfig, PipelineContext, ReadingPipeline};
pub use vision::TextRecognizer;
