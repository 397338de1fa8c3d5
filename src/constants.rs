/// MIME type of compiled video documents
pub const WEBM_MIME_TYPE: &str = "video/webm";

/// MIME type of exported audio
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Media type accepted for encoded frames
pub const WEBP_MEDIA_TYPE: &str = "image/webp";

/// Prefix of a base64 WebP data URI
pub const WEBP_DATA_URI_PREFIX: &str = "data:image/webp;base64,";

/// Written to both MuxingApp and WritingApp
pub const APP_NAME: &str = "stillcut";

/// Nanoseconds per timecode tick (1 ms)
pub const TIMECODE_SCALE_NS: u64 = 1_000_000;

/// Frame rate used when none is configured
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

/// Quality handed to surface encoders when none is configured
pub const DEFAULT_QUALITY: f32 = 0.8;
