//! Summarization backend for the Gemini `generateContent` API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use deck_core::{Error, Result, SummaryRequest, Summarizer};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Sends each prompt (and figure image, if any) to a Gemini model.
pub struct GeminiSummarizer {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiSummarizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::ConfigError("Gemini API key is empty".to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::SummarizerError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Create a summarizer with the key from `GEMINI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Error::ConfigError(format!("{} is not set", API_KEY_ENV)))?;
        Self::new(api_key, model)
    }

    /// Point the client at another API root (proxies, local test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the generateContent API.
    fn build_request_body(prompt: &str, image: Option<serde_json::Value>) -> serde_json::Value {
        let mut parts = vec![json!({ "text": prompt })];
        parts.extend(image);

        json!({
            "contents": [{
                "role": "user",
                "parts": parts,
            }],
        })
    }

    /// Read an image file into an `inline_data` part.
    fn inline_image(path: &Path) -> Result<serde_json::Value> {
        let bytes = std::fs::read(path)?;
        Ok(json!({
            "inline_data": {
                "mime_type": image_mime_type(path),
                "data": STANDARD.encode(bytes),
            },
        }))
    }

    /// Concatenated text of the first candidate's parts.
    fn response_text(response: &serde_json::Value) -> Result<String> {
        let parts = response["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| {
                let reason = response["promptFeedback"]["blockReason"]
                    .as_str()
                    .unwrap_or("missing candidates[0].content.parts");
                Error::SummarizerError(format!("Gemini returned no content: {}", reason))
            })?;

        let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
        Ok(text.trim().to_string())
    }
}

impl Summarizer for GeminiSummarizer {
    fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let image = match &request.image {
            Some(path) => Some(Self::inline_image(path)?),
            None => None,
        };
        let body = Self::build_request_body(&request.prompt, image);

        log::debug!(
            "Gemini request to model={} (image: {})",
            self.model,
            request.image.is_some()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::SummarizerError(format!("Gemini request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::SummarizerError(format!(
                "Gemini returned {}: {}",
                status,
                body.trim()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| Error::SummarizerError(format!("Invalid Gemini response: {}", e.without_url())))?;
        Self::response_text(&json)
    }
}

/// MIME type for an image file, judged by extension.
fn image_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/jpeg",
    }
}
