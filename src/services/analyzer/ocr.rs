//! Tesseract text extraction via the command-line binary.

use super::{encode_png, TextExtractor};
use crate::error::AppError;
use image::DynamicImage;
use std::io::Write;
use std::process::{Command, Stdio};

pub struct TesseractExtractor {
    binary: String,
    language: String,
}

impl TesseractExtractor {
    pub fn new(binary: &str, language: &str) -> Self {
        Self {
            binary: binary.to_string(),
            language: language.to_string(),
        }
    }

    /// Feeds PNG bytes on stdin and reads the recognized text from stdout.
    fn run_tesseract(&self, png: &[u8]) -> Result<String, AppError> {
        let child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::text_extraction(format!(
                    "{} not found (install tesseract-ocr)",
                    self.binary
                )));
            }
            Err(e) => {
                return Err(AppError::text_extraction(format!(
                    "Failed to start {}: {}",
                    self.binary, e
                )))
            }
        };

        // tesseract reads the whole image before writing anything, so writing
        // stdin fully before collecting stdout cannot deadlock.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(png).map_err(|e| {
                AppError::text_extraction(format!("Failed to pipe image to tesseract: {}", e))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            AppError::text_extraction(format!("tesseract did not finish: {}", e))
        })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(AppError::text_extraction(format!(
                "tesseract failed: {}",
                stderr.trim()
            )))
        }
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract_text(&self, image: &DynamicImage) -> Result<String, AppError> {
        let png = encode_png(image)?;
        self.run_tesseract(&png)
    }
}
