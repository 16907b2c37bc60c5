//! Error types for the Gemini client

use std::fmt;

/// Errors that can occur when calling the Gemini API
#[derive(Debug)]
pub enum GeminiError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// Failed to parse JSON (either the envelope or the generated payload)
    Json(serde_json::Error),
    /// The API answered with a non-success status
    Api { status: u16, message: String },
    /// The response carried no usable candidate part
    EmptyResponse(String),
    /// Inline image data was present but not a usable image
    InvalidImage(String),
}

impl fmt::Display for GeminiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Gemini HTTP error: {}", e),
            Self::Json(e) => write!(f, "Gemini JSON parse error: {}", e),
            Self::Api { status, message } => {
                write!(f, "Gemini API error ({}): {}", status, message)
            }
            Self::EmptyResponse(what) => write!(f, "Gemini returned no {}", what),
            Self::InvalidImage(msg) => write!(f, "Gemini returned an invalid image: {}", msg),
        }
    }
}

impl std::error::Error for GeminiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for GeminiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for Gemini API operations
pub type Result<T> = std::result::Result<T, GeminiError>;
