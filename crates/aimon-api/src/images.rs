//! Image decoding and persistence
//!
//! Images arrive as base64 (raw or as a `data:` URL) and are written to a
//! content-addressed directory that the server exposes under a URL prefix.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Raw image bytes with their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

#[derive(Debug)]
pub enum ImageError {
    InvalidData(String),
    NotFound(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::InvalidData(msg) => write!(f, "Invalid image data: {}", msg),
            ImageError::NotFound(reference) => write!(f, "Image not found: {}", reference),
            ImageError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        ImageError::Io(Box::new(err))
    }
}

/// Decode a base64 image, accepting either raw base64 or a `data:` URL
pub fn decode_base64_image(data: &str) -> Result<DecodedImage, ImageError> {
    let data = data.trim();
    if data.is_empty() {
        return Err(ImageError::InvalidData("empty payload".into()));
    }

    let (declared_mime, payload) = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| ImageError::InvalidData("malformed data URL".into()))?;
            let mime = header
                .strip_suffix(";base64")
                .ok_or_else(|| ImageError::InvalidData("data URL is not base64".into()))?;
            (Some(mime.to_string()), payload)
        }
        None => (None, data),
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ImageError::InvalidData(e.to_string()))?;
    if bytes.is_empty() {
        return Err(ImageError::InvalidData("empty payload".into()));
    }

    let mime_type = declared_mime
        .filter(|m| m.starts_with("image/"))
        .unwrap_or_else(|| sniff_mime_type(&bytes).to_string());

    Ok(DecodedImage { mime_type, bytes })
}

fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}

fn mime_from_extension(file_name: &str) -> &'static str {
    match file_name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Addressable image storage
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an image, returning a stable reference path
    async fn save(&self, image: &DecodedImage) -> Result<String, ImageError>;

    /// Read back an image previously returned by [`ImageStore::save`]
    async fn load(&self, reference: &str) -> Result<DecodedImage, ImageError>;
}

/// Stores images as `<sha256>.<ext>` files in a directory
pub struct FsImageStore {
    dir: PathBuf,
    url_prefix: String,
}

impl FsImageStore {
    pub fn new(dir: PathBuf, url_prefix: &str) -> Self {
        Self {
            dir,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Create the image directory if needed
    pub async fn init(&self) -> Result<(), ImageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn file_name_for(&self, reference: &str) -> Option<String> {
        let name = reference
            .strip_prefix(&self.url_prefix)?
            .strip_prefix('/')?;
        let plain = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
        plain.then(|| name.to_string())
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, image: &DecodedImage) -> Result<String, ImageError> {
        let digest = hex::encode(Sha256::digest(&image.bytes));
        let file_name = format!("{}.{}", digest, image.extension());
        let path = self.dir.join(&file_name);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::write(&path, &image.bytes).await?;
        }

        debug!(file = %file_name, size = image.bytes.len(), "Saved image");
        Ok(format!("{}/{}", self.url_prefix, file_name))
    }

    async fn load(&self, reference: &str) -> Result<DecodedImage, ImageError> {
        let file_name = self
            .file_name_for(reference)
            .ok_or_else(|| ImageError::NotFound(reference.to_string()))?;

        let bytes = match tokio::fs::read(self.dir.join(&file_name)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImageError::NotFound(reference.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(DecodedImage {
            mime_type: mime_from_extension(&file_name).to_string(),
            bytes,
        })
    }
}
