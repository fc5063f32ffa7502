use serde::Serialize;
use std::fmt;

/// What went wrong, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SourceNotFound,
    Decode,
    TextExtraction,
    DetectorUnavailable,
    FaceDetection,
    CaptionGeneration,
    Persistence,
    Output,
    Config,
    Io,
}

impl ErrorKind {
    /// Fatal kinds abort the whole run; everything else is isolated to one image.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::SourceNotFound | ErrorKind::Output | ErrorKind::Config
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SourceNotFound => "source_not_found",
            ErrorKind::Decode => "decode",
            ErrorKind::TextExtraction => "text_extraction",
            ErrorKind::DetectorUnavailable => "detector_unavailable",
            ErrorKind::FaceDetection => "face_detection",
            ErrorKind::CaptionGeneration => "caption_generation",
            ErrorKind::Persistence => "persistence",
            ErrorKind::Output => "output",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        AppError {
            kind,
            message: message.into(),
        }
    }

    pub fn source_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SourceNotFound, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Decode, message)
    }

    pub fn text_extraction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TextExtraction, message)
    }

    pub fn detector_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DetectorUnavailable, message)
    }

    pub fn face_detection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FaceDetection, message)
    }

    pub fn caption(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CaptionGeneration, message)
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Output, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Re-tags an error, keeping its message. Used when a generic conversion
    /// (io, image) happens in a stage that owns a more specific kind.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::new(ErrorKind::Io, err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::new(ErrorKind::Decode, err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::new(ErrorKind::Io, err.to_string())
    }
}

impl From<ort::Error> for AppError {
    fn from(err: ort::Error) -> Self {
        AppError::new(ErrorKind::FaceDetection, err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::new(ErrorKind::Output, err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::new(ErrorKind::Config, err.to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::new(ErrorKind::Io, msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::new(ErrorKind::Io, msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_run_level_kinds_are_fatal() {
        assert!(ErrorKind::SourceNotFound.is_fatal());
        assert!(ErrorKind::Output.is_fatal());
        assert!(!ErrorKind::Decode.is_fatal());
        assert!(!ErrorKind::DetectorUnavailable.is_fatal());
        assert!(!ErrorKind::Persistence.is_fatal());
    }

    #[test]
    fn with_kind_keeps_message() {
        let err = AppError::from("boom").with_kind(ErrorKind::Persistence);
        assert_eq!(err.kind, ErrorKind::Persistence);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn serializes_kind_in_snake_case() {
        let err = AppError::detector_unavailable("model missing");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "detector_unavailable");
        assert_eq!(json["message"], "model missing");
    }
}
