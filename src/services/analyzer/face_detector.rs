//! Face detection with an UltraFace-style ONNX model (320x240 input,
//! `scores` [1, N, 2] and `boxes` [1, N, 4] outputs in that order).

use super::model_manager::{FaceModel, ModelStore};
use super::FaceDetector;
use crate::error::AppError;
use image::imageops::FilterType;
use image::GrayImage;
use ndarray::Array4;
use ort::value::Value;
use std::sync::Mutex;

const INPUT_WIDTH: u32 = 320;
const INPUT_HEIGHT: u32 = 240;
const PIXEL_MEAN: f32 = 127.0;
const PIXEL_SCALE: f32 = 128.0;

// Detector parameters are fixed, not per call.
const SCORE_THRESHOLD: f32 = 0.7;
const IOU_THRESHOLD: f32 = 0.3;

/// Corner box in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    score: f32,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &Candidate) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = w * h;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// The session is loaded on first use. A load failure fails only the current
/// image; the next image tries again.
pub struct OnnxFaceDetector {
    store: ModelStore,
    session: Mutex<Option<FaceModel>>,
}

impl OnnxFaceDetector {
    pub fn new(store: ModelStore) -> Self {
        Self {
            store,
            session: Mutex::new(None),
        }
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect_faces(&self, gray: &GrayImage) -> Result<usize, AppError> {
        let tensor = preprocess_gray(gray)?;

        let mut guard = self
            .session
            .lock()
            .map_err(|_| AppError::face_detection("Face detector lock poisoned"))?;
        if guard.is_none() {
            *guard = Some(self.store.load_session()?);
        }
        let session = guard
            .as_mut()
            .ok_or_else(|| AppError::detector_unavailable("Face model not loaded"))?;

        let input_name = session.inputs()[0].name().to_string();
        let input_tensor = Value::from_array(tensor).map_err(|e| {
            AppError::face_detection(format!("Failed to create tensor value: {}", e))
        })?;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input_tensor])
            .map_err(|e| AppError::face_detection(format!("Inference failed: {}", e)))?;

        let mut values = outputs.values();
        let score_value = values
            .next()
            .ok_or_else(|| AppError::face_detection("Model produced no score output"))?;
        let (_, scores) = score_value
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::face_detection(format!("Failed to extract scores: {}", e)))?;
        let box_value = values
            .next()
            .ok_or_else(|| AppError::face_detection("Model produced no box output"))?;
        let (_, boxes) = box_value
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::face_detection(format!("Failed to extract boxes: {}", e)))?;

        Ok(count_faces(scores, boxes))
    }
}

/// Resizes to the model input and replicates the gray channel into an NCHW
/// tensor normalized as `(p - 127) / 128`.
fn preprocess_gray(gray: &GrayImage) -> Result<Array4<f32>, AppError> {
    if gray.width() == 0 || gray.height() == 0 {
        return Err(AppError::face_detection("Image has no pixels"));
    }

    let resized = image::imageops::resize(gray, INPUT_WIDTH, INPUT_HEIGHT, FilterType::Triangle);
    let hw = (INPUT_WIDTH * INPUT_HEIGHT) as usize;
    let plane: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|p| (p as f32 - PIXEL_MEAN) / PIXEL_SCALE)
        .collect();

    let mut data = Vec::with_capacity(3 * hw);
    for _ in 0..3 {
        data.extend_from_slice(&plane);
    }

    Array4::from_shape_vec(
        (1, 3, INPUT_HEIGHT as usize, INPUT_WIDTH as usize),
        data,
    )
    .map_err(|e| AppError::face_detection(format!("Failed to create tensor: {}", e)))
}

/// Keeps candidates whose face score clears the threshold, merges overlaps
/// with non-maximum suppression and returns how many remain.
fn count_faces(scores: &[f32], boxes: &[f32]) -> usize {
    let mut candidates: Vec<Candidate> = scores
        .chunks_exact(2)
        .zip(boxes.chunks_exact(4))
        .filter(|(s, _)| s[1] >= SCORE_THRESHOLD)
        .map(|(s, b)| Candidate {
            score: s[1],
            x1: b[0],
            y1: b[1],
            x2: b[2],
            y2: b[3],
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| k.iou(&candidate) < IOU_THRESHOLD) {
            kept.push(candidate);
        }
    }
    kept.len()
}
