use crate::bits::ValueTooLarge;
use crate::webp::WebpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while collecting frames, building a document or exporting audio.
#[derive(Debug, Error)]
pub enum Error {
    /// Frame input is neither a surface nor WebP bytes
    #[error("unsupported frame format: {0}")]
    UnsupportedFrameFormat(String),

    /// Frame rate and explicit duration are both set, or neither is
    #[error("invalid duration configuration: {0}")]
    InvalidDurationConfig(String),

    /// A frame could not be parsed
    #[error("frame {index}: {source}")]
    Frame {
        index: usize,
        #[source]
        source: WebpError,
    },

    #[error("frame {index} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    FrameDimensionMismatch {
        index: usize,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("frame {index} has invalid duration {duration_ms} ms")]
    InvalidFrameDuration { index: usize, duration_ms: f64 },

    #[error("quality must be in (0, 1], got {0}")]
    InvalidQuality(f32),

    #[error("no frames to compile")]
    EmptyFrameSequence,

    /// Block timecodes are signed 16-bit milliseconds relative to the single cluster
    #[error("frame {index} starts at {timecode_ms} ms, beyond the {max} ms cluster range", max = i16::MAX)]
    TimecodeOverflow { index: usize, timecode_ms: i64 },

    #[error(transparent)]
    ValueTooLarge(#[from] ValueTooLarge),

    #[error("collector has already been compiled")]
    AlreadyCompiled,

    #[error("left channel has {left} samples, right channel has {right}")]
    ChannelLengthMismatch { left: usize, right: usize },

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

impl Error {
    /// Index of the offending frame, when the error concerns one.
    pub fn frame_index(&self) -> Option<usize> {
        match self {
            Error::Frame { index, .. }
            | Error::FrameDimensionMismatch { index, .. }
            | Error::InvalidFrameDuration { index, .. }
            | Error::TimecodeOverflow { index, .. } => Some(*index),
            _ => None,
        }
    }
}
