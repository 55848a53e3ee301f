//! Gemini `generateContent` as a recognition backend.

use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::RecognizerError;
use crate::ocr::{ImageVariant, Recognizer};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const TEMPERATURE: f64 = 0.25;

const TRANSCRIBE_PROMPT: &str =
    "Extract all Hindi and English text from the image. Output plain text only.";

const STRUCTURED_PROMPT: &str = r#"You are a forensic document reconstruction system for Indian police records (FIRs, affidavits).

1. Extract and normalize all text from the scanned document, removing OCR noise.
2. Reconstruct it into clean, readable Devanagari text, keeping headings and numbered sections.
3. Extract: police station (थाना), incident date and time, accused (अभियुक्त), victim (पीड़ित), and any other metadata such as FIR number, IPC sections or district.

If a field is not found, return "Null". Respond with JSON only:
{
  "clean_hindi_text": "...",
  "structured_data": {
    "police_station": "...",
    "incident_timing": "...",
    "people_involved": { "accused": "...", "victim": "..." },
    "additional_fields": { "key": "value" }
  },
  "entities": { "persons": [], "locations": [], "dates": [], "legal_sections": [] }
}"#;

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Sends each variant to a Gemini model. The HTTP client is built on first
/// use and dropped by `shutdown`.
pub struct VisionRecognizer {
    model: String,
    api_key: Option<String>,
    client: Option<Client>,
}

impl VisionRecognizer {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client: None,
        }
    }

    /// Reads the key from `GEMINI_API_KEY`, falling back to `GOOGLE_AI_API_KEY`.
    pub fn from_env(model: impl Into<String>) -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_AI_API_KEY"))
            .ok();
        Self::new(model, api_key)
    }

    /// Asks the model for the full structured record as JSON. The reply is
    /// returned verbatim for validation by the caller.
    pub fn extract_structured(&mut self, variant: &ImageVariant) -> Result<String, RecognizerError> {
        self.generate(variant, STRUCTURED_PROMPT, "application/json")
    }

    fn generate(
        &mut self,
        variant: &ImageVariant,
        prompt: &str,
        response_mime_type: &str,
    ) -> Result<String, RecognizerError> {
        let api_key = self.api_key.clone().ok_or_else(|| {
            RecognizerError::Unavailable(
                "set GEMINI_API_KEY to use the vision backend".to_string(),
            )
        })?;
        let url = format!("{API_BASE}/{}:generateContent", self.model);

        let image = fs::read(&variant.path).map_err(|err| {
            RecognizerError::call(
                &variant.label,
                format!("failed to read {}: {err}", variant.path.display()),
            )
        })?;
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    {
                        "inline_data": {
                            "mime_type": mime_type(&variant.path),
                            "data": BASE64_STANDARD.encode(&image),
                        }
                    }
                ]
            }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "responseMimeType": response_mime_type,
            }
        });

        let client = self.client()?.clone();
        debug!(model = %self.model, variant = %variant.label, bytes = image.len(), "calling vision model");
        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|err| RecognizerError::call(&variant.label, format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = format!("server returned {}: {}", status.as_u16(), body.trim());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    RecognizerError::Unavailable(message)
                }
                _ => RecognizerError::call(&variant.label, message),
            });
        }

        let payload = response
            .text()
            .map_err(|err| RecognizerError::call(&variant.label, format!("failed to read response: {err}")))?;
        response_text(&payload)
    }

    fn client(&mut self) -> Result<&Client, RecognizerError> {
        if self.client.is_none() {
            let client = Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| RecognizerError::Backend(format!("failed to build HTTP client: {err}")))?;
            info!(model = %self.model, "vision client ready");
            self.client = Some(client);
        }
        self.client
            .as_ref()
            .ok_or_else(|| RecognizerError::Backend("HTTP client missing".to_string()))
    }
}

impl Recognizer for VisionRecognizer {
    fn name(&self) -> &str {
        "vision"
    }

    fn recognize(&mut self, variant: &ImageVariant) -> Result<String, RecognizerError> {
        self.generate(variant, TRANSCRIBE_PROMPT, "text/plain")
    }

    fn version(&self) -> Option<String> {
        Some(self.model.clone())
    }

    fn shutdown(&mut self) {
        if self.client.take().is_some() {
            debug!("released vision client");
        }
    }
}

fn response_text(payload: &str) -> Result<String, RecognizerError> {
    let response: GenerateResponse = serde_json::from_str(payload)
        .map_err(|err| RecognizerError::Backend(format!("unexpected response shape: {err}")))?;
    Ok(response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect::<Vec<String>>()
        .join(""))
}

fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "image/png",
    }
}
