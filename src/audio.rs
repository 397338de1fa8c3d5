//! WAV export for recorded audio.
//!
//! Audio is delivered as its own blob next to the WebM document; it is never
//! muxed into the container.

use crate::constants::WAV_MIME_TYPE;
use crate::error::{Error, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// A finished WAV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

/// Interleave two channels as L, R, L, R, ...
pub fn interleave(left: &[f32], right: &[f32]) -> Result<Vec<f32>> {
    if left.len() != right.len() {
        return Err(Error::ChannelLengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(left
        .iter()
        .zip(right)
        .flat_map(|(&l, &r)| [l, r])
        .collect())
}

/// Convert a float sample in [-1, 1] to 16-bit PCM, clamping out-of-range input.
pub fn to_i16(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encode stereo float buffers as a 16-bit PCM WAV.
pub fn encode_wav(left: &[f32], right: &[f32], sample_rate: u32) -> Result<AudioBlob> {
    let samples = interleave(left, right)?;
    write_wav(&samples, 2, sample_rate)
}

/// Encode a single channel as a 16-bit PCM WAV.
pub fn encode_wav_mono(samples: &[f32], sample_rate: u32) -> Result<AudioBlob> {
    write_wav(samples, 1, sample_rate)
}

fn write_wav(samples: &[f32], channels: u16, sample_rate: u32) -> Result<AudioBlob> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;
    }
    Ok(AudioBlob {
        bytes: cursor.into_inner(),
        mime_type: WAV_MIME_TYPE,
    })
}
