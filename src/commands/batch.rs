use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::meme_types::{BatchResult, ItemFailure};
use crate::services::analyzer::ImageAnalyzer;
use crate::services::{archive_service, fs_service, meme_classifier, result_writer};
use tracing::{error, info, warn};

/// Runs one batch: analyze every supported image in the source folder,
/// archive the memes, then write all successful records as JSON.
///
/// Only a missing source or an unwritable result file aborts the run; every
/// per-image problem is logged, recorded on `failures`, and skipped.
pub fn run_batch(
    config: &PipelineConfig,
    analyzer: &ImageAnalyzer,
) -> Result<BatchResult, AppError> {
    let image_paths = fs_service::list_image_files(&config.source_dir)?;

    if let Err(e) = fs_service::ensure_dir(&config.dest_dir) {
        warn!("{}; memes will not be archived", e);
    }

    let total = image_paths.len();
    info!(
        "Found {} image(s) in {}",
        total,
        config.source_dir.display()
    );

    let mut result = BatchResult {
        scanned: total,
        ..BatchResult::default()
    };

    for (i, img_path) in image_paths.iter().enumerate() {
        let file_name = fs_service::file_name_of(img_path);

        let analyzed = match analyzer.analyze(img_path) {
            Ok(analyzed) => analyzed,
            Err(e) => {
                warn!("[{}/{}] Failed to process {}: {}", i + 1, total, file_name, e);
                result.failures.push(ItemFailure::new(file_name, &e));
                continue;
            }
        };

        let record = analyzed.record;
        if meme_classifier::is_meme(record.extracted_text(), analyzed.face_count) {
            let archived =
                archive_service::archive_meme(img_path, &config.dest_dir, record.caption());
            match archived {
                Ok(saved) => {
                    info!(
                        "[{}/{}] {} is a meme, saved as {}",
                        i + 1,
                        total,
                        file_name,
                        saved.display()
                    );
                    result.archived.push(saved);
                }
                Err(e) => {
                    error!("[{}/{}] Failed to archive {}: {}", i + 1, total, file_name, e);
                    result.failures.push(ItemFailure::new(file_name.as_str(), &e));
                }
            }
        } else {
            info!("[{}/{}] Processed {}", i + 1, total, file_name);
        }

        result.records.push(record);
    }

    result_writer::write_results(&config.output_path, &result.records)?;

    info!(
        "Meme analysis completed: {} analyzed, {} archived, {} failed. Results saved to {}",
        result.records.len(),
        result.archived.len(),
        result.failures.len(),
        config.output_path.display()
    );

    Ok(result)
}
