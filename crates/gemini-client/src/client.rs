//! Gemini API HTTP client

use crate::error::{GeminiError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the Gemini `generateContent` endpoint
///
/// The API key is supplied per call so a single client can serve requests
/// that bring their own key.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Public Gemini API endpoint
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    /// Create a client against the public endpoint (120 second timeout;
    /// image generation is slow)
    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(120))
    }

    /// Create a client against a custom endpoint with a custom timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send a raw `generateContent` request
    pub async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        debug!(model, "Calling Gemini generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            warn!(model, status = %status, message = %message, "Gemini request failed");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Generate a structured JSON answer and parse it as `T`
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        api_key: &str,
        model: &str,
        parts: Vec<Part>,
    ) -> Result<T> {
        let request = GenerateContentRequest::user(parts).with_config(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_modalities: None,
        });

        let response = self.generate_content(api_key, model, &request).await?;
        let text = response
            .text()
            .ok_or_else(|| GeminiError::EmptyResponse("text".to_string()))?;

        Ok(serde_json::from_str(strip_code_fence(&text))?)
    }

    /// Generate an image, returning the first inline image part
    pub async fn generate_image(
        &self,
        api_key: &str,
        model: &str,
        parts: Vec<Part>,
    ) -> Result<InlineData> {
        let request = GenerateContentRequest::user(parts).with_config(GenerationConfig {
            response_mime_type: None,
            response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
        });

        let response = self.generate_content(api_key, model, &request).await?;
        response
            .first_inline_data()
            .cloned()
            .ok_or_else(|| GeminiError::EmptyResponse("image".to_string()))
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Models occasionally wrap JSON in a markdown fence even when asked not to
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
