pub mod meme_types;
