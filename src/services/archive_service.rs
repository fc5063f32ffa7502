//! Archiving of classified memes into the destination folder.
//!
//! Files are opened with create-new semantics, so an existing file is never
//! overwritten: on a name collision the stem gets a numeric suffix, and if
//! every suffix is taken a random `untitled_` name is used.

use crate::error::AppError;
use crate::services::fs_service::sanitize_filename;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

const FALLBACK_PREFIX: &str = "untitled_";
const ARCHIVE_EXTENSION: &str = "jpg";
const ARCHIVE_QUALITY: u8 = 95;
const MAX_SUFFIX: u32 = 999;

/// `untitled_` plus 8 hex chars of a v4 UUID. Unique with overwhelming
/// probability, not guaranteed.
pub fn fallback_stem() -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", FALLBACK_PREFIX, &token[..8])
}

/// The file stem an archived meme gets for `caption`.
pub fn archive_stem(caption: &str) -> String {
    let stem = sanitize_filename(caption);
    if stem.trim().is_empty() {
        fallback_stem()
    } else {
        stem
    }
}

/// Copies `source` into `dest_dir` as `<stem>.jpg` and returns the path
/// written. Sources whose content is JPEG are copied byte for byte, anything
/// else is re-encoded to JPEG, whatever the source extension says.
pub fn archive_meme(source: &Path, dest_dir: &Path, caption: &str) -> Result<PathBuf, AppError> {
    let stem = archive_stem(caption);
    let (dest_path, file) = create_unique(dest_dir, &stem)?;

    let written = if is_jpeg(source) {
        copy_bytes(source, file)
    } else {
        transcode_to_jpeg(source, file)
    };

    if let Err(e) = written {
        // Leave no half-written file behind under a name a later run would skip.
        let _ = std::fs::remove_file(&dest_path);
        return Err(AppError::persistence(format!(
            "Failed to write {}: {}",
            dest_path.display(),
            e.message
        )));
    }

    Ok(dest_path)
}

/// Sniffs the leading bytes; the extension is not trusted.
fn is_jpeg(path: &Path) -> bool {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map(|reader| reader.format() == Some(ImageFormat::Jpeg))
        .unwrap_or(false)
}

fn open_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Claims a free name under `dir`: `<stem>.jpg`, then `<stem>_1.jpg` ..
/// `<stem>_999.jpg`, then a random fallback.
fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File), AppError> {
    let candidates = std::iter::once(stem.to_string())
        .chain((1..=MAX_SUFFIX).map(|n| format!("{}_{}", stem, n)))
        .chain(std::iter::once(fallback_stem()));

    for candidate in candidates {
        let path = dir.join(format!("{}.{}", candidate, ARCHIVE_EXTENSION));
        match open_new(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(AppError::persistence(format!(
                    "Failed to create {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    Err(AppError::persistence(format!(
        "No free file name for '{}' in {}",
        stem,
        dir.display()
    )))
}

fn copy_bytes(source: &Path, dest: File) -> Result<(), AppError> {
    let mut reader = File::open(source)?;
    let mut writer = BufWriter::new(dest);
    std::io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn transcode_to_jpeg(source: &Path, dest: File) -> Result<(), AppError> {
    let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let mut writer = BufWriter::new(dest);
    let encoder = JpegEncoder::new_with_quality(&mut writer, ARCHIVE_QUALITY);
    img.to_rgb8().write_with_encoder(encoder)?;
    writer.flush()?;
    Ok(())
}
