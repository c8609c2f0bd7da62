pub mod options;
pub mod result;
pub mod runner;
pub mod stream;

pub use options::{Preset, ProcessingOptions};
pub use result::AnalysisResult;
pub use runner::{AnalysisRequest, Analyzer, LasAnalyzer};
pub use stream::{BoundsPass, StreamOptions, StreamSummary, StreamingPipeline};
