use crate::error::AppError;
use crate::models::meme_types::AnalysisRecord;
use std::path::Path;

/// Pretty-printed JSON array of records. Non-ASCII is kept literal.
pub fn to_json(records: &[AnalysisRecord]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Writes the records to `path`, creating the parent folder if needed.
pub fn write_results(path: &Path, records: &[AnalysisRecord]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::output(format!(
                "Failed to create output folder {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut json = to_json(records)?;
    json.push('\n');
    std::fs::write(path, json)
        .map_err(|e| AppError::output(format!("Failed to write {}: {}", path.display(), e)))
}
