//! Caption generation against an HTTP image-to-text endpoint.
//!
//! The request body is `{"inputs": "<base64 PNG>"}`; the endpoint answers
//! with `[{"generated_text": "..."}]` or a bare `{"generated_text": "..."}`.

use super::{encode_png, CaptionGenerator};
use crate::error::AppError;
use base64::Engine;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct CaptionRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaptionResponse {
    Many(Vec<GeneratedText>),
    One(GeneratedText),
}

impl CaptionResponse {
    fn into_caption(self) -> Result<String, AppError> {
        let text = match self {
            CaptionResponse::Many(list) => list
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .ok_or_else(|| AppError::caption("Caption endpoint returned no captions"))?,
            CaptionResponse::One(g) => g.generated_text,
        };
        Ok(text.trim().to_string())
    }
}

pub struct HttpCaptioner {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpCaptioner {
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build caption client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token,
        })
    }
}

impl CaptionGenerator for HttpCaptioner {
    fn generate_caption(&self, image: &DynamicImage) -> Result<String, AppError> {
        let png = encode_png(image)?;
        let payload = base64::engine::general_purpose::STANDARD.encode(&png);

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&CaptionRequest { inputs: &payload });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| AppError::caption(format!("Caption request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::caption(format!(
                "Caption endpoint {} returned HTTP {}",
                self.endpoint,
                response.status()
            )));
        }

        let body: CaptionResponse = response
            .json()
            .map_err(|e| AppError::caption(format!("Failed to parse caption response: {}", e)))?;

        body.into_caption()
    }
}

/// Used when no caption endpoint is configured. Always fails, which the
/// analyzer turns into an empty caption.
pub struct DisabledCaptioner;

impl CaptionGenerator for DisabledCaptioner {
    fn generate_caption(&self, _image: &DynamicImage) -> Result<String, AppError> {
        Err(AppError::caption("No caption endpoint configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::RgbImage;

    fn parse(body: &str) -> Result<String, AppError> {
        serde_json::from_str::<CaptionResponse>(body)
            .map_err(AppError::from)?
            .into_caption()
    }

    #[test]
    fn reads_first_caption_from_list() {
        let caption = parse(r#"[{"generated_text": "a cat sitting on a couch "}, {"generated_text": "x"}]"#);
        assert_eq!(caption.unwrap(), "a cat sitting on a couch");
    }

    #[test]
    fn reads_single_object() {
        assert_eq!(parse(r#"{"generated_text": "two men"}"#).unwrap(), "two men");
    }

    #[test]
    fn empty_list_is_caption_error() {
        let err = parse("[]").unwrap_err();
        assert_eq!(err.kind, ErrorKind::CaptionGeneration);
    }

    #[test]
    fn disabled_captioner_always_fails() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let err = DisabledCaptioner.generate_caption(&img).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CaptionGeneration);
    }
}
