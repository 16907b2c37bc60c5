/// Cache key holding the full gallery listing.
pub const GALLERY_CACHE_KEY: &str = "gallery:all";

/// Default lifetime (seconds) of the cached gallery listing.
pub const DEFAULT_GALLERY_TTL_SECS: u64 = 300;

/// Upper bound on entries held by the in-process cache backend.
pub const CACHE_MAX_CAPACITY: u64 = 1_000;

/// Characters of the original doodle payload kept for provenance.
pub const DOODLE_SOURCE_MAX_CHARS: usize = 200;

/// Request body limit; base64 doodles and images are large.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;
