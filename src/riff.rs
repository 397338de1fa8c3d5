//! RIFF chunk parser.
//!
//! ## Chunk layout
//!
//! ```text
//! | Offset | Size | Field                          |
//! |--------|------|--------------------------------|
//! | 0      | 4    | FourCC tag                     |
//! | 4      | 4    | payload length (u32, LE)       |
//! | 8      | N    | payload                        |
//! | 8+N    | 0/1  | pad byte when N is odd         |
//! ```
//!
//! `RIFF` and `LIST` payloads start with a 4-byte form type followed by a
//! nested chunk sequence. Everything else is an opaque leaf.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Chunk header size in bytes (tag + length).
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Four-character chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const RIFF: FourCC = FourCC(*b"RIFF");
    pub const LIST: FourCC = FourCC(*b"LIST");

    pub fn is_container(self) -> bool {
        self == FourCC::RIFF || self == FourCC::LIST
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({:?})", String::from_utf8_lossy(&self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RiffError {
    /// A header or payload runs past the end of the input
    #[error("truncated RIFF data at offset {offset}: chunk '{tag}' needs {needed} bytes, {available} available")]
    TruncatedData {
        offset: usize,
        tag: String,
        needed: usize,
        available: usize,
    },
}

/// Same-tag siblings, in file order, keyed by tag.
pub type ChunkMap = BTreeMap<FourCC, Vec<RiffChunk>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiffChunk {
    pub fourcc: FourCC,
    /// Full payload, including the form type for containers
    pub data: Vec<u8>,
    /// Form or list type of a container chunk
    pub form_type: Option<FourCC>,
    pub children: ChunkMap,
}

impl RiffChunk {
    /// Children tagged `tag`, empty when there are none.
    pub fn children_of(&self, tag: FourCC) -> &[RiffChunk] {
        self.children.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parse a chunk sequence into a tag-keyed tree.
pub fn parse(data: &[u8]) -> Result<ChunkMap, RiffError> {
    parse_at(data, 0)
}

fn parse_at(data: &[u8], base: usize) -> Result<ChunkMap, RiffError> {
    let mut chunks = ChunkMap::new();
    let mut pos = 0;

    while pos < data.len() {
        let remaining = data.len() - pos;
        if remaining < CHUNK_HEADER_SIZE {
            return Err(RiffError::TruncatedData {
                offset: base + pos,
                tag: String::from_utf8_lossy(&data[pos..]).into_owned(),
                needed: CHUNK_HEADER_SIZE,
                available: remaining,
            });
        }

        let fourcc = FourCC([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        let len = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        pos += CHUNK_HEADER_SIZE;

        if len > data.len() - pos {
            return Err(RiffError::TruncatedData {
                offset: base + pos,
                tag: fourcc.to_string(),
                needed: len,
                available: data.len() - pos,
            });
        }

        let payload = &data[pos..pos + len];
        let chunk = if fourcc.is_container() && len >= 4 {
            RiffChunk {
                fourcc,
                data: payload.to_vec(),
                form_type: Some(FourCC([payload[0], payload[1], payload[2], payload[3]])),
                children: parse_at(&payload[4..], base + pos + 4)?,
            }
        } else {
            RiffChunk {
                fourcc,
                data: payload.to_vec(),
                form_type: None,
                children: ChunkMap::new(),
            }
        };
        chunks.entry(fourcc).or_default().push(chunk);

        // odd-sized payloads are followed by a pad byte, which may be missing at EOF
        pos += len + (len & 1);
    }

    Ok(chunks)
}
