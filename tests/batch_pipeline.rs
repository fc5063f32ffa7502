use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use meme_sorter_lib::{
    run_batch, AppError, CaptionGenerator, ErrorKind, FaceDetector, ImageAnalyzer,
    PipelineConfig, TextExtractor,
};
use std::path::Path;
use tempfile::{tempdir, TempDir};

const RED: Rgb<u8> = Rgb([255, 0, 0]);
const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Red images carry a long caption-like text, everything else none.
struct ColorText;
impl TextExtractor for ColorText {
    fn extract_text(&self, image: &DynamicImage) -> Result<String, AppError> {
        let px = *image.to_rgb8().get_pixel(0, 0);
        if px[0] > 200 && px[1] < 50 {
            Ok("ONE DOES NOT SIMPLY WALK INTO MORDOR\n".to_string())
        } else {
            Ok("  \n".to_string())
        }
    }
}

/// Bright gray (green converts to high luma) means one face.
struct LumaFaces;
impl FaceDetector for LumaFaces {
    fn detect_faces(&self, gray: &GrayImage) -> Result<usize, AppError> {
        Ok(if gray.get_pixel(0, 0)[0] > 150 { 1 } else { 0 })
    }
}

struct FixedCaption(&'static str);
impl CaptionGenerator for FixedCaption {
    fn generate_caption(&self, _image: &DynamicImage) -> Result<String, AppError> {
        Ok(self.0.to_string())
    }
}

/// Names the dominant channel, so lossy JPEG pixels still map to one caption.
struct ColorCaption;
impl CaptionGenerator for ColorCaption {
    fn generate_caption(&self, image: &DynamicImage) -> Result<String, AppError> {
        let px = *image.to_rgb8().get_pixel(0, 0);
        let color = if px[0] >= px[1] && px[0] >= px[2] {
            "red"
        } else if px[1] >= px[2] {
            "green"
        } else {
            "blue"
        };
        Ok(format!("a {} square: the meme", color))
    }
}

struct BrokenCaption;
impl CaptionGenerator for BrokenCaption {
    fn generate_caption(&self, _image: &DynamicImage) -> Result<String, AppError> {
        Err(AppError::caption("caption model unavailable"))
    }
}

fn analyzer(captioner: impl CaptionGenerator + 'static) -> ImageAnalyzer {
    ImageAnalyzer::new(Box::new(ColorText), Box::new(LumaFaces), Box::new(captioner))
}

fn save(dir: &Path, name: &str, color: Rgb<u8>) {
    RgbImage::from_pixel(16, 16, color).save(dir.join(name)).unwrap();
}

struct Workspace {
    _root: TempDir,
    config: PipelineConfig,
}

fn workspace() -> Workspace {
    let root = tempdir().unwrap();
    let source = root.path().join("in");
    std::fs::create_dir(&source).unwrap();
    let config = PipelineConfig::new(
        source,
        root.path().join("out"),
        root.path().join("results.json"),
    );
    Workspace {
        _root: root,
        config,
    }
}

fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn read_results(path: &Path) -> Vec<serde_json::Value> {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn three_images_yield_three_records_and_two_archives() {
    let ws = workspace();
    save(&ws.config.source_dir, "text.png", RED);
    save(&ws.config.source_dir, "face.jpg", GREEN);
    save(&ws.config.source_dir, "plain.png", BLUE);
    std::fs::write(ws.config.source_dir.join("readme.txt"), b"ignored").unwrap();

    let result = run_batch(&ws.config, &analyzer(ColorCaption)).unwrap();

    assert_eq!(result.scanned, 3);
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.archived.len(), 2);
    assert!(result.failures.is_empty());

    let records = read_results(&ws.config.output_path);
    let mut names: Vec<&str> = records
        .iter()
        .map(|r| r["filename"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["face.jpg", "plain.png", "text.png"]);

    assert_eq!(
        dir_names(&ws.config.dest_dir),
        vec!["a green square_ the meme.jpg", "a red square_ the meme.jpg"]
    );
}

#[test]
fn corrupt_file_is_skipped_and_valid_file_still_processed() {
    let ws = workspace();
    std::fs::write(ws.config.source_dir.join("aaa_corrupt.jpg"), b"\xFF\xD8 garbage").unwrap();
    save(&ws.config.source_dir, "zzz_valid.png", BLUE);

    let result = run_batch(&ws.config, &analyzer(FixedCaption("fine"))).unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].filename, "aaa_corrupt.jpg");
    assert_eq!(result.failures[0].kind, ErrorKind::Decode);

    let records = read_results(&ws.config.output_path);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["filename"], "zzz_valid.png");
}

#[test]
fn failing_captioner_still_archives_under_fallback_name() {
    let ws = workspace();
    save(&ws.config.source_dir, "face.png", GREEN);

    let result = run_batch(&ws.config, &analyzer(BrokenCaption)).unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].caption(), "");
    let names = dir_names(&ws.config.dest_dir);
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("untitled_"), "{}", names[0]);
    assert!(names[0].ends_with(".jpg"));
}

#[test]
fn rerun_with_existing_archive_does_not_crash_or_overwrite() {
    let ws = workspace();
    save(&ws.config.source_dir, "face.png", GREEN);
    std::fs::create_dir(&ws.config.dest_dir).unwrap();
    std::fs::write(ws.config.dest_dir.join("same caption.jpg"), b"older meme").unwrap();

    run_batch(&ws.config, &analyzer(FixedCaption("same caption"))).unwrap();
    run_batch(&ws.config, &analyzer(FixedCaption("same caption"))).unwrap();

    assert_eq!(
        dir_names(&ws.config.dest_dir),
        vec!["same caption.jpg", "same caption_1.jpg", "same caption_2.jpg"]
    );
    assert_eq!(
        std::fs::read(ws.config.dest_dir.join("same caption.jpg")).unwrap(),
        b"older meme"
    );
}

#[test]
fn archive_failure_keeps_record_and_batch_continues() {
    let ws = workspace();
    std::fs::write(&ws.config.dest_dir, b"a file, not a folder").unwrap();
    save(&ws.config.source_dir, "face.png", GREEN);
    save(&ws.config.source_dir, "plain.png", BLUE);

    let result = run_batch(&ws.config, &analyzer(FixedCaption("a face"))).unwrap();

    assert_eq!(result.records.len(), 2);
    assert!(result.archived.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].filename, "face.png");
    assert_eq!(result.failures[0].kind, ErrorKind::Persistence);

    let records = read_results(&ws.config.output_path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["filename"], "face.png");
    assert_eq!(records[0]["caption"], "a face");
    assert_eq!(records[1]["filename"], "plain.png");
}

#[test]
fn reserved_characters_in_caption_are_sanitized() {
    let ws = workspace();
    save(&ws.config.source_dir, "text.png", RED);

    run_batch(&ws.config, &analyzer(FixedCaption("what? a \"meme\" / joke"))).unwrap();

    assert_eq!(
        dir_names(&ws.config.dest_dir),
        vec!["what_ a _meme_ _ joke.jpg"]
    );
}

#[test]
fn missing_source_aborts_before_writing_output() {
    let ws = workspace();
    let config = PipelineConfig::new(
        ws.config.source_dir.join("does-not-exist"),
        ws.config.dest_dir.clone(),
        ws.config.output_path.clone(),
    );

    let err = run_batch(&config, &analyzer(FixedCaption("x"))).unwrap_err();

    assert_eq!(err.kind, ErrorKind::SourceNotFound);
    assert!(!config.output_path.exists());
    assert!(!config.dest_dir.exists());
}

#[test]
fn empty_source_writes_empty_array() {
    let ws = workspace();

    let result = run_batch(&ws.config, &analyzer(FixedCaption("x"))).unwrap();

    assert_eq!(result.scanned, 0);
    assert!(read_results(&ws.config.output_path).is_empty());
    assert!(ws.config.dest_dir.is_dir());
}

#[test]
fn single_file_source_is_processed() {
    let ws = workspace();
    save(&ws.config.source_dir, "solo.png", RED);
    let config = PipelineConfig::new(
        ws.config.source_dir.join("solo.png"),
        ws.config.dest_dir.clone(),
        ws.config.output_path.clone(),
    );

    let result = run_batch(&config, &analyzer(FixedCaption("solo"))).unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.archived, vec![config.dest_dir.join("solo.jpg")]);
}

#[test]
fn source_folder_is_left_untouched() {
    let ws = workspace();
    save(&ws.config.source_dir, "text.png", RED);
    save(&ws.config.source_dir, "face.jpg", GREEN);
    let before = dir_names(&ws.config.source_dir);

    run_batch(&ws.config, &analyzer(ColorCaption)).unwrap();

    assert_eq!(dir_names(&ws.config.source_dir), before);
}
