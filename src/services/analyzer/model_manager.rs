use crate::error::AppError;
use ort::session::Session;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

pub type FaceModel = Session;

/// Where the face-detector model lives and, optionally, where to fetch it from.
#[derive(Debug, Clone)]
pub struct ModelStore {
    model_path: PathBuf,
    model_url: Option<String>,
}

impl ModelStore {
    pub fn new(model_path: PathBuf, model_url: Option<String>) -> Self {
        Self {
            model_path,
            model_url,
        }
    }

    pub fn is_downloaded(&self) -> bool {
        self.model_path.is_file()
    }

    /// Makes sure the model file is on disk, downloading it when a URL is
    /// configured.
    pub fn ensure_downloaded(&self) -> Result<&Path, AppError> {
        if self.is_downloaded() {
            return Ok(&self.model_path);
        }

        let url = self.model_url.as_deref().ok_or_else(|| {
            AppError::detector_unavailable(format!(
                "Face model missing: {} (no download URL configured)",
                self.model_path.display()
            ))
        })?;

        if let Some(parent) = self.model_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::detector_unavailable(format!(
                    "Failed to create model directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        info!("Downloading face model from {}", url);
        download_file(url, &self.model_path)?;
        Ok(&self.model_path)
    }

    pub fn load_session(&self) -> Result<FaceModel, AppError> {
        let model_path = self.ensure_downloaded()?;

        let _ = ort::init().with_name("meme-sorter").commit();

        let session = Session::builder()
            .map_err(|e| unavailable("Failed to create session builder", e))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| unavailable("Failed to set optimization level", e))?
            .with_intra_threads(4)
            .map_err(|e| unavailable("Failed to set intra threads", e))?
            .with_execution_providers([
                ort::ep::CPU::default().build(),
            ])
            .map_err(|e| unavailable("Failed to register CPU execution provider", e))?
            .commit_from_file(model_path)
            .map_err(|e| {
                AppError::detector_unavailable(format!(
                    "Failed to load ONNX model {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        info!("Loaded face model {}", model_path.display());
        Ok(session)
    }
}

fn unavailable(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::detector_unavailable(format!("{}: {}", what, e))
}

/// Streams `url` into `<dest>.part` and renames it into place once complete.
fn download_file(url: &str, dest: &Path) -> Result<(), AppError> {
    let mut response = reqwest::blocking::get(url).map_err(|e| {
        AppError::detector_unavailable(format!("Failed to download {}: {}", url, e))
    })?;

    if !response.status().is_success() {
        return Err(AppError::detector_unavailable(format!(
            "Failed to download {}: HTTP {}",
            url,
            response.status()
        )));
    }

    let mut part_name = dest.as_os_str().to_owned();
    part_name.push(".part");
    let part_path = PathBuf::from(part_name);

    let written = File::create(&part_path)
        .map_err(AppError::from)
        .and_then(|mut file| response.copy_to(&mut file).map_err(AppError::from));

    if let Err(e) = written {
        let _ = std::fs::remove_file(&part_path);
        return Err(AppError::detector_unavailable(format!(
            "Failed to write {}: {}",
            part_path.display(),
            e
        )));
    }

    std::fs::rename(&part_path, dest).map_err(|e| {
        AppError::detector_unavailable(format!(
            "Failed to move model into place at {}: {}",
            dest.display(),
            e
        ))
    })
}
