//! Pixel dimensions of lossy WebP frames.
//!
//! A lossy WebP is `RIFF(WEBP) -> "VP8 "`; the VP8 key frame header carries
//! the start code `9D 01 2A` followed by two little-endian 16-bit fields,
//! width then height. The top two bits of each field are an upscaling hint
//! and are masked off.

use crate::riff::{self, ChunkMap, FourCC, RiffError};
use thiserror::Error;

pub const WEBP_FORM: FourCC = FourCC(*b"WEBP");
pub const VP8_CHUNK: FourCC = FourCC(*b"VP8 ");

/// VP8 key frame start code.
pub const KEYFRAME_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];

const DIMENSION_MASK: u16 = 0x3FFF;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebpError {
    #[error(transparent)]
    Riff(#[from] RiffError),
    #[error("no RIFF/WEBP container with a VP8 bitstream chunk")]
    MissingBitstream,
    #[error("VP8 key frame start code not found")]
    SignatureNotFound,
    #[error("VP8 frame header truncated after start code at offset {offset}")]
    TruncatedData { offset: usize },
}

/// Dimensions and bitstream of one frame, borrowed from the parsed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebpFrame<'a> {
    pub width: u32,
    pub height: u32,
    /// Payload of the `VP8 ` chunk
    pub bitstream: &'a [u8],
}

/// Find the VP8 bitstream in a parsed WebP and read its key frame size.
pub fn extract_dimensions(tree: &ChunkMap) -> Result<WebpFrame<'_>, WebpError> {
    let bitstream = tree
        .get(&FourCC::RIFF)
        .into_iter()
        .flatten()
        .filter(|chunk| chunk.form_type == Some(WEBP_FORM))
        .find_map(|chunk| chunk.children_of(VP8_CHUNK).first())
        .ok_or(WebpError::MissingBitstream)?;
    let data = bitstream.data.as_slice();

    let start = data
        .windows(KEYFRAME_START_CODE.len())
        .position(|w| w == KEYFRAME_START_CODE)
        .ok_or(WebpError::SignatureNotFound)?;
    let fields = start + KEYFRAME_START_CODE.len();
    let Some(dims) = data.get(fields..fields + 4) else {
        return Err(WebpError::TruncatedData { offset: fields });
    };

    let width = u16::from_le_bytes([dims[0], dims[1]]) & DIMENSION_MASK;
    let height = u16::from_le_bytes([dims[2], dims[3]]) & DIMENSION_MASK;
    Ok(WebpFrame {
        width: width as u32,
        height: height as u32,
        bitstream: data,
    })
}

/// Parse a WebP file and extract its dimensions in one go.
pub fn inspect(bytes: &[u8]) -> Result<(u32, u32, Vec<u8>), WebpError> {
    let tree = riff::parse(bytes)?;
    let frame = extract_dimensions(&tree)?;
    Ok((frame.width, frame.height, frame.bitstream.to_vec()))
}
