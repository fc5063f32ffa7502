//! Per-image analysis: decode, OCR, face detection, captioning.
//!
//! The three model-backed stages are traits so they can be swapped for
//! fakes; `ImageAnalyzer::from_config` wires up the real implementations.

pub mod captioner;
pub mod face_detector;
pub mod model_manager;
pub mod ocr;

use crate::config::AnalyzerConfig;
use crate::error::{AppError, ErrorKind};
use crate::models::meme_types::{AnalysisRecord, AnalyzedImage};
use crate::services::fs_service::file_name_of;
use captioner::{DisabledCaptioner, HttpCaptioner};
use face_detector::OnnxFaceDetector;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader};
use model_manager::ModelStore;
use ocr::TesseractExtractor;
use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Recovers printed text from an RGB image. No text is `Ok("")`.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, image: &DynamicImage) -> Result<String, AppError>;
}

/// Counts faces in a grayscale image.
pub trait FaceDetector: Send + Sync {
    fn detect_faces(&self, gray: &GrayImage) -> Result<usize, AppError>;
}

/// Produces a one-line description of an RGB image.
pub trait CaptionGenerator: Send + Sync {
    fn generate_caption(&self, image: &DynamicImage) -> Result<String, AppError>;
}

pub struct ImageAnalyzer {
    text: Box<dyn TextExtractor>,
    faces: Box<dyn FaceDetector>,
    captioner: Box<dyn CaptionGenerator>,
}

impl ImageAnalyzer {
    pub fn new(
        text: Box<dyn TextExtractor>,
        faces: Box<dyn FaceDetector>,
        captioner: Box<dyn CaptionGenerator>,
    ) -> Self {
        Self {
            text,
            faces,
            captioner,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Result<Self, AppError> {
        let text = TesseractExtractor::new(&config.tesseract_bin, &config.ocr_language);
        let faces = OnnxFaceDetector::new(ModelStore::new(
            config.face_model_path.clone(),
            config.face_model_url.clone(),
        ));
        let captioner: Box<dyn CaptionGenerator> = match &config.caption_endpoint {
            Some(endpoint) => Box::new(HttpCaptioner::new(
                endpoint,
                config.caption_token.clone(),
                Duration::from_secs(config.caption_timeout_secs),
            )?),
            None => Box::new(DisabledCaptioner),
        };

        Ok(Self::new(Box::new(text), Box::new(faces), captioner))
    }

    /// Analyzes one image. Decode, OCR and face-detection failures fail this
    /// image only; a caption failure is absorbed into an empty caption.
    pub fn analyze(&self, path: &Path) -> Result<AnalyzedImage, AppError> {
        let filename = file_name_of(path);
        let img = decode_image(path)?;
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

        let start = Instant::now();
        let extracted_text = self
            .text
            .extract_text(&rgb)
            .map_err(|e| e.with_kind(ErrorKind::TextExtraction))?;
        debug!(
            "OCR {} took {}ms",
            filename,
            start.elapsed().as_millis()
        );

        let start = Instant::now();
        let gray = img.to_luma8();
        let face_count = self.faces.detect_faces(&gray).map_err(|e| {
            if e.kind == ErrorKind::DetectorUnavailable {
                e
            } else {
                e.with_kind(ErrorKind::FaceDetection)
            }
        })?;
        debug!(
            "Face detection {} found {} in {}ms",
            filename,
            face_count,
            start.elapsed().as_millis()
        );

        let caption = match self.captioner.generate_caption(&rgb) {
            Ok(caption) => caption,
            Err(e) => {
                warn!("Caption generation failed for {}: {}", filename, e);
                String::new()
            }
        };

        Ok(AnalyzedImage {
            record: AnalysisRecord::new(filename, extracted_text, caption),
            face_count,
        })
    }
}

fn decode_image(path: &Path) -> Result<DynamicImage, AppError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| {
            AppError::decode(format!("Failed to open image {}: {}", path.display(), e))
        })?
        .decode()
        .map_err(|e| {
            AppError::decode(format!("Failed to decode image {}: {}", path.display(), e))
        })
}

pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, AppError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
