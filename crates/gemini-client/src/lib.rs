//! Minimal Rust client for the Gemini `generateContent` API
//!
//! Covers the two shapes of call the Aimon backend needs: structured JSON
//! generation and image generation, both optionally guided by reference
//! images passed inline.
//!
//! # Example
//!
//! ```no_run
//! use gemini_client::{GeminiClient, Part};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Caption {
//!     caption: String,
//! }
//!
//! # async fn example() -> Result<(), gemini_client::GeminiError> {
//! let client = GeminiClient::new();
//! let caption: Caption = client
//!     .generate_json(
//!         "api-key",
//!         "gemini-2.5-flash",
//!         vec![Part::text("Return {\"caption\": ...} for a smiling cat")],
//!     )
//!     .await?;
//! println!("{}", caption.caption);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::GeminiClient;
pub use error::{GeminiError, Result};
pub use types::{
    ApiErrorBody, ApiErrorDetail, Candidate, Content, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, InlineData, Part,
};
