use crate::error::AppError;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Characters that are reserved in file names on at least one target filesystem.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_NAME_CHARS: usize = 50;

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Replaces reserved characters with `_` and caps the result at 50 characters.
/// Total and idempotent; the result may be empty or whitespace-only.
pub fn sanitize_filename(raw: &str) -> String {
    raw.chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_NAME_CHARS)
        .collect()
}

/// Supported image files directly inside `source`, sorted by lowercase file
/// name. A `source` that is itself a supported image yields just that file.
pub fn list_image_files(source: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !source.exists() {
        return Err(AppError::source_not_found(format!(
            "Source folder does not exist: {}",
            source.display()
        )));
    }

    if source.is_file() {
        if is_image_file(source) {
            return Ok(vec![source.to_path_buf()]);
        }
        return Err(AppError::source_not_found(format!(
            "Source is neither a folder nor a supported image: {}",
            source.display()
        )));
    }

    let mut images = Vec::new();

    let walker = WalkDir::new(source)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", source.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.into_path();
        if is_image_file(&path) {
            images.push(path);
        }
    }

    images.sort_by_key(|p| file_name_of(p).to_lowercase());

    Ok(images)
}

/// Creates `dir` if needed. Idempotent.
pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        AppError::persistence(format!(
            "Failed to create directory {}: {}",
            dir.display(),
            e
        ))
    })
}
