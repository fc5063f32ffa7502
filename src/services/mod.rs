pub mod analyzer;
pub mod archive_service;
pub mod fs_service;
pub mod meme_classifier;
pub mod result_writer;
