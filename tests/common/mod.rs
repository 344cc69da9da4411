#![allow(dead_code)]

mod fixtures;
mod http;
pub use fixtures::*;
pub use http::*;

// Re-export commonly used types from oilmeter for tests
pub use oilmeter::{
    Configuration, PipelineError, ReadingOutcome, ReadingPipeline, RecognitionResult,
};
