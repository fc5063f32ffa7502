pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use commands::batch::run_batch;
pub use config::{AnalyzerConfig, AppConfig, ConfigFile, PipelineConfig};
pub use error::{AppError, ErrorKind};
pub use models::meme_types::{AnalysisRecord, AnalyzedImage, BatchResult, ItemFailure};
pub use services::analyzer::{CaptionGenerator, FaceDetector, ImageAnalyzer, TextExtractor};

/// Builds the real collaborators from `config.analyzer` and runs one batch.
pub fn run(config: &AppConfig) -> Result<BatchResult, AppError> {
    let analyzer = ImageAnalyzer::from_config(&config.analyzer)?;
    run_batch(&config.pipeline, &analyzer)
}
