pub mod preprocessing;
pub mod roi;
pub mod steps;
pub mod ocr;
pub mod text;
pub mod number;

pub use ocr::{build_recognizer, EngineKind, OcrsRecognizer, TesseractRecognizer, TextRecognizer};
pub use roi::resolve;
pub use steps::condition;
