/// Trimmed OCR text must be longer than this many characters to count.
pub const MIN_TEXT_CHARS: usize = 20;

/// An image is a meme when it carries more than 20 characters of text
/// (after trimming) or shows at least one face.
pub fn is_meme(extracted_text: &str, face_count: usize) -> bool {
    extracted_text.trim().chars().count() > MIN_TEXT_CHARS || face_count > 0
}
