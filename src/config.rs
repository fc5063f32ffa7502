//! Run configuration.
//!
//! `PipelineConfig` carries the three paths a run needs and has no defaults.
//! `AnalyzerConfig` configures the collaborators and defaults to a local
//! tesseract install, a face model under `models/`, and no caption endpoint.

use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub output_path: PathBuf,
}

impl PipelineConfig {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        dest_dir: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            output_path: output_path.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub ocr_language: String,
    pub tesseract_bin: String,
    pub face_model_path: PathBuf,
    pub face_model_url: Option<String>,
    pub caption_endpoint: Option<String>,
    pub caption_token: Option<String>,
    pub caption_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ocr_language: "eng".to_string(),
            tesseract_bin: "tesseract".to_string(),
            face_model_path: PathBuf::from("models/version-RFB-320.onnx"),
            face_model_url: None,
            caption_endpoint: None,
            caption_token: None,
            caption_timeout_secs: 60,
        }
    }
}

/// On-disk layout of a config file. Pipeline paths are optional here so that
/// CLI flags can supply them; `AppConfig::resolve` enforces that all three
/// end up set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub source_dir: Option<PathBuf>,
    pub dest_dir: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub analyzer: AnalyzerConfig,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub analyzer: AnalyzerConfig,
}

impl AppConfig {
    /// Merges a config file with explicit overrides (CLI flags win).
    pub fn resolve(
        file: ConfigFile,
        source_dir: Option<PathBuf>,
        dest_dir: Option<PathBuf>,
        output_path: Option<PathBuf>,
    ) -> Result<Self, AppError> {
        let source_dir = source_dir
            .or(file.source_dir)
            .ok_or_else(|| AppError::config("source_dir is required"))?;
        let dest_dir = dest_dir
            .or(file.dest_dir)
            .ok_or_else(|| AppError::config("dest_dir is required"))?;
        let output_path = output_path
            .or(file.output_path)
            .ok_or_else(|| AppError::config("output_path is required"))?;

        Ok(Self {
            pipeline: PipelineConfig {
                source_dir,
                dest_dir,
                output_path,
            },
            analyzer: file.analyzer,
        })
    }
}
