//! Incremental frame collection in front of [`webm::build`].

use crate::constants::{DEFAULT_QUALITY, WEBP_DATA_URI_PREFIX, WEBP_MEDIA_TYPE};
use crate::error::{Error, Result};
use crate::webm::{self, Document, Frame};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;

/// A drawable surface that can re-encode itself as a lossy WebP file.
///
/// Implemented by whatever owns the pixels (a canvas, a capture buffer).
pub trait WebpSurface {
    /// Encode the current contents. `quality` is in `(0, 1]`.
    fn encode_webp(&self, quality: f32) -> std::result::Result<Vec<u8>, String>;
}

/// Anything [`FrameCollector::add`] accepts.
pub enum FrameInput<'a> {
    Surface(&'a dyn WebpSurface),
    /// `data:image/webp;base64,...`
    DataUri(&'a str),
    Encoded { media_type: &'a str, bytes: Vec<u8> },
}

impl<'a> FrameInput<'a> {
    /// Raw WebP bytes.
    pub fn webp(bytes: Vec<u8>) -> Self {
        FrameInput::Encoded {
            media_type: WEBP_MEDIA_TYPE,
            bytes,
        }
    }

    fn into_payload(self, quality: f32) -> Result<Vec<u8>> {
        match self {
            FrameInput::Surface(surface) => surface
                .encode_webp(quality)
                .map_err(|e| Error::UnsupportedFrameFormat(format!("surface encoding failed: {}", e))),
            FrameInput::DataUri(uri) => decode_data_uri(uri),
            FrameInput::Encoded { media_type, bytes } => {
                if media_type.eq_ignore_ascii_case(WEBP_MEDIA_TYPE) {
                    Ok(bytes)
                } else {
                    Err(Error::UnsupportedFrameFormat(format!(
                        "media type {} is not {}",
                        media_type, WEBP_MEDIA_TYPE
                    )))
                }
            }
        }
    }
}

/// Decode a `data:image/webp;base64,` URI into WebP bytes.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let prefix_len = WEBP_DATA_URI_PREFIX.len();
    let has_prefix = uri
        .get(..prefix_len)
        .is_some_and(|p| p.eq_ignore_ascii_case(WEBP_DATA_URI_PREFIX));
    if !has_prefix {
        let shown: String = uri.chars().take(32).collect();
        return Err(Error::UnsupportedFrameFormat(format!(
            "expected a {} data URI, got {:?}",
            WEBP_MEDIA_TYPE, shown
        )));
    }
    STANDARD
        .decode(&uri[prefix_len..])
        .map_err(|e| Error::UnsupportedFrameFormat(format!("invalid base64 payload: {}", e)))
}

#[derive(Debug)]
enum Phase {
    Collecting(Vec<Frame>),
    Compiled,
}

/// Buffers frames until [`FrameCollector::compile`] turns them into a WebM.
///
/// Durations come either from a fixed frame rate set at construction or from
/// each `add` call, never both. Once compiled the collector is spent: further
/// `add` or `compile` calls fail with [`Error::AlreadyCompiled`]. A failed
/// compile keeps the collector (and its frames) in the collecting phase.
#[derive(Debug)]
pub struct FrameCollector {
    frame_duration_ms: Option<f64>,
    quality: f32,
    phase: Phase,
}

impl FrameCollector {
    pub fn new(frame_rate: Option<f64>) -> Result<Self> {
        let frame_duration_ms = match frame_rate {
            Some(fps) if fps.is_finite() && fps > 0.0 => Some(1000.0 / fps),
            Some(fps) => {
                return Err(Error::InvalidDurationConfig(format!(
                    "frame rate must be positive, got {}",
                    fps
                )))
            }
            None => None,
        };
        Ok(Self {
            frame_duration_ms,
            quality: DEFAULT_QUALITY,
            phase: Phase::Collecting(Vec::new()),
        })
    }

    /// Quality passed to [`WebpSurface::encode_webp`].
    pub fn with_quality(mut self, quality: f32) -> Result<Self> {
        if !(quality > 0.0 && quality <= 1.0) {
            return Err(Error::InvalidQuality(quality));
        }
        self.quality = quality;
        Ok(self)
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Number of frames accepted so far (0 once compiled).
    pub fn len(&self) -> usize {
        match &self.phase {
            Phase::Collecting(frames) => frames.len(),
            Phase::Compiled => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self.phase, Phase::Compiled)
    }

    /// Append a frame. A rejected frame leaves earlier frames untouched.
    pub fn add(&mut self, input: FrameInput<'_>, duration_ms: Option<f64>) -> Result<()> {
        let Phase::Collecting(frames) = &mut self.phase else {
            return Err(Error::AlreadyCompiled);
        };
        let duration_ms = match (self.frame_duration_ms, duration_ms) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidDurationConfig(
                    "a frame duration cannot be given when the frame rate is set".to_string(),
                ))
            }
            (None, None) => {
                return Err(Error::InvalidDurationConfig(
                    "a frame duration is required when no frame rate is set".to_string(),
                ))
            }
            (Some(d), None) | (None, Some(d)) => d,
        };
        let payload = input.into_payload(self.quality)?;
        debug!(
            "Accepted frame {} ({} bytes, {} ms)",
            frames.len(),
            payload.len(),
            duration_ms
        );
        frames.push(Frame::new(payload, duration_ms));
        Ok(())
    }

    /// Build the WebM document from every frame added so far.
    pub fn compile(&mut self) -> Result<Document> {
        let Phase::Collecting(frames) = &self.phase else {
            return Err(Error::AlreadyCompiled);
        };
        let document = webm::build(frames)?;
        self.phase = Phase::Compiled;
        Ok(document)
    }
}

/// Compile a list of frames shown at a fixed frame rate.
pub fn from_image_array<'a, I>(images: I, frame_rate: f64) -> Result<Document>
where
    I: IntoIterator<Item = FrameInput<'a>>,
{
    let mut collector = FrameCollector::new(Some(frame_rate))?;
    for image in images {
        collector.add(image, None)?;
    }
    collector.compile()
}
