use crate::error::{AppError, ErrorKind};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;

/// One successfully analyzed image. Serialized with the interop key names
/// `filename`, `text`, `caption`, `processed_time`.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AnalysisRecord {
    filename: String,
    #[serde(rename = "text")]
    extracted_text: String,
    caption: String,
    processed_time: DateTime<Local>,
}

impl AnalysisRecord {
    /// Stamps `processed_time` with the current local time.
    pub fn new(filename: String, extracted_text: String, caption: String) -> Self {
        Self {
            filename,
            extracted_text,
            caption,
            processed_time: Local::now(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }
}

/// Analyzer output: the record plus the face count, which is only consumed
/// by the meme classifier and never serialized.
#[derive(Debug, Clone)]
pub struct AnalyzedImage {
    pub record: AnalysisRecord,
    pub face_count: usize,
}

#[derive(Debug, Serialize, Clone)]
pub struct ItemFailure {
    pub filename: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl ItemFailure {
    pub fn new(filename: impl Into<String>, err: &AppError) -> Self {
        Self {
            filename: filename.into(),
            kind: err.kind,
            message: err.message.clone(),
        }
    }
}

/// Everything a run produced. Only `records` is written to the JSON artifact.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub scanned: usize,
    pub records: Vec<AnalysisRecord>,
    pub failures: Vec<ItemFailure>,
    pub archived: Vec<PathBuf>,
}
