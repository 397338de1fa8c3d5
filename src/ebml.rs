//! EBML element tree: encoder and a schema-driven reader.

use crate::bits::{self, BitWriter, ValueTooLarge};
use crate::schema::{id_width, ElementId, ElementKind};
use serde::Serialize;
use thiserror::Error;

/// Longest vint size prefix, in bytes.
pub const MAX_VINT_LEN: u32 = 8;

/// A node of an EBML document.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Master { id: ElementId, children: Vec<Element> },
    /// `width` forces a payload width in bytes; `None` means minimal.
    UInt { id: ElementId, value: u64, width: Option<u32> },
    Float { id: ElementId, value: f64 },
    Str { id: ElementId, value: String },
    Binary { id: ElementId, value: Vec<u8> },
    /// An ID outside the schema; the payload is kept verbatim.
    Unknown { id: u32, data: Vec<u8> },
}

impl Element {
    pub fn master(id: ElementId, children: Vec<Element>) -> Self {
        Element::Master { id, children }
    }

    pub fn uint(id: ElementId, value: u64) -> Self {
        Element::UInt { id, value, width: None }
    }

    pub fn float(id: ElementId, value: f64) -> Self {
        Element::Float { id, value }
    }

    pub fn string(id: ElementId, value: impl Into<String>) -> Self {
        Element::Str { id, value: value.into() }
    }

    pub fn binary(id: ElementId, value: Vec<u8>) -> Self {
        Element::Binary { id, value }
    }

    /// Schema ID, or `None` for an unknown element.
    pub fn id(&self) -> Option<ElementId> {
        match self {
            Element::Master { id, .. }
            | Element::UInt { id, .. }
            | Element::Float { id, .. }
            | Element::Str { id, .. }
            | Element::Binary { id, .. } => Some(*id),
            Element::Unknown { .. } => None,
        }
    }

    /// ID as written in the document, length marker included.
    pub fn raw_id(&self) -> u32 {
        match self {
            Element::Unknown { id, .. } => *id,
            _ => self.id().map_or(0, ElementId::value),
        }
    }

    /// Children of a master element; empty for leaves.
    pub fn children(&self) -> &[Element] {
        match self {
            Element::Master { children, .. } => children,
            _ => &[],
        }
    }

    /// First direct child with the given ID.
    pub fn child(&self, id: ElementId) -> Option<&Element> {
        self.children().iter().find(|c| c.id() == Some(id))
    }

    fn payload(&self) -> Result<Vec<u8>, ValueTooLarge> {
        match self {
            Element::Master { children, .. } => encode(children),
            Element::UInt { value, width, .. } => {
                bits::pack_bits(*value, width.map_or(0, |w| w * 8))
            }
            Element::Float { value, .. } => Ok(value.to_be_bytes().to_vec()),
            Element::Str { value, .. } => Ok(value.as_bytes().to_vec()),
            Element::Binary { value, .. } => Ok(value.clone()),
            Element::Unknown { data, .. } => Ok(data.clone()),
        }
    }

    /// Append `id ++ size ++ payload` to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<(), ValueTooLarge> {
        let id = self.raw_id();
        let payload = self.payload()?;
        buf.extend_from_slice(&bits::pack_bits(id as u64, id_width(id) * 8)?);
        buf.extend_from_slice(&encode_vint(payload.len() as u64)?);
        buf.extend_from_slice(&payload);
        Ok(())
    }
}

/// Serialize a sequence of root elements.
pub fn encode(tree: &[Element]) -> Result<Vec<u8>, ValueTooLarge> {
    let mut buf = Vec::new();
    for element in tree {
        element.encode_into(&mut buf)?;
    }
    Ok(buf)
}

/// Encode a size as an EBML vint.
///
/// Uses `ceil(bits/7)` bytes, one more when every value bit would be set:
/// that pattern is reserved for "unknown size".
pub fn encode_vint(size: u64) -> Result<Vec<u8>, ValueTooLarge> {
    let mut len = bits::bit_length(size).div_ceil(7).max(1);
    if len < MAX_VINT_LEN && size == (1u64 << (7 * len)) - 1 {
        len += 1;
    }
    let max = (1u64 << (7 * MAX_VINT_LEN)) - 1;
    if len > MAX_VINT_LEN || size >= max {
        return Err(ValueTooLarge {
            value: size,
            bits: bits::bit_length(size),
            max_bits: 7 * MAX_VINT_LEN,
        });
    }
    let mut writer = BitWriter::new();
    writer.push(1, len)?.push(size, 7 * len)?;
    Ok(writer.finish())
}

/// Errors from reading an EBML document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("truncated data at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("invalid vint at offset {offset}")]
    InvalidVint { offset: usize },
    #[error("element at offset {offset} declares unknown size")]
    UnknownSize { offset: usize },
    #[error("element {name} at offset {offset} has a {len}-byte payload, expected {expected}")]
    BadPayloadLength {
        name: &'static str,
        offset: usize,
        len: usize,
        expected: &'static str,
    },
}

/// Decode a vint, returning `(value, encoded_len)`.
///
/// The marker bit is stripped; the remaining bits are the value.
pub fn read_vint(data: &[u8]) -> Result<(u64, usize), ReadError> {
    let first = *data.first().ok_or(ReadError::Truncated {
        offset: 0,
        needed: 1,
        available: 0,
    })?;
    if first == 0 {
        return Err(ReadError::InvalidVint { offset: 0 });
    }
    let len = first.leading_zeros() as usize + 1;
    if data.len() < len {
        return Err(ReadError::Truncated {
            offset: 0,
            needed: len,
            available: data.len(),
        });
    }
    let mut value = (first as u64) & (0xFF >> len);
    for &byte in &data[1..len] {
        value = (value << 8) | byte as u64;
    }
    Ok((value, len))
}

fn read_id(data: &[u8], offset: usize) -> Result<(u32, usize), ReadError> {
    let first = *data.first().ok_or(ReadError::Truncated {
        offset,
        needed: 1,
        available: 0,
    })?;
    let len = first.leading_zeros() as usize + 1;
    if first == 0 || len > 4 {
        return Err(ReadError::InvalidVint { offset });
    }
    if data.len() < len {
        return Err(ReadError::Truncated {
            offset,
            needed: len,
            available: data.len(),
        });
    }
    let id = data[..len].iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
    Ok((id, len))
}

/// Parse a whole document, interpreting payloads by their schema kind.
///
/// IDs outside the schema come back as [`Element::Unknown`] at any depth.
pub fn decode(data: &[u8]) -> Result<Vec<Element>, ReadError> {
    decode_at(data, 0)
}

fn decode_at(data: &[u8], base: usize) -> Result<Vec<Element>, ReadError> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let offset = base + pos;
        let (raw_id, id_len) = read_id(&data[pos..], offset)?;
        pos += id_len;
        let (size, size_len) = read_vint(&data[pos..]).map_err(|e| rebase(e, base + pos))?;
        if size == (1u64 << (7 * size_len)) - 1 {
            return Err(ReadError::UnknownSize { offset });
        }
        pos += size_len;
        let size = size as usize;
        if data.len() - pos < size {
            return Err(ReadError::Truncated {
                offset: base + pos,
                needed: size,
                available: data.len() - pos,
            });
        }
        let payload = &data[pos..pos + size];
        out.push(decode_payload(raw_id, payload, offset, base + pos)?);
        pos += size;
    }
    Ok(out)
}

fn rebase(err: ReadError, offset: usize) -> ReadError {
    match err {
        ReadError::Truncated { needed, available, .. } => ReadError::Truncated {
            offset,
            needed,
            available,
        },
        ReadError::InvalidVint { .. } => ReadError::InvalidVint { offset },
        other => other,
    }
}

fn decode_payload(
    raw_id: u32,
    payload: &[u8],
    offset: usize,
    payload_offset: usize,
) -> Result<Element, ReadError> {
    let Some(id) = ElementId::from_u32(raw_id) else {
        return Ok(Element::Unknown {
            id: raw_id,
            data: payload.to_vec(),
        });
    };
    let element = match id.kind() {
        ElementKind::Master => Element::master(id, decode_at(payload, payload_offset)?),
        ElementKind::UInt => {
            if payload.len() > 8 {
                return Err(ReadError::BadPayloadLength {
                    name: id.name(),
                    offset,
                    len: payload.len(),
                    expected: "at most 8",
                });
            }
            let value = payload.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
            Element::UInt {
                id,
                value,
                width: Some(payload.len() as u32),
            }
        }
        ElementKind::Float => match payload.len() {
            0 => Element::float(id, 0.0),
            8 => Element::float(id, f64::from_be_bytes(to_array(payload))),
            4 => Element::float(id, f32::from_be_bytes(to_array(payload)) as f64),
            len => {
                return Err(ReadError::BadPayloadLength {
                    name: id.name(),
                    offset,
                    len,
                    expected: "0, 4 or 8",
                })
            }
        },
        ElementKind::String => Element::string(id, String::from_utf8_lossy(payload)),
        ElementKind::Binary => Element::binary(id, payload.to_vec()),
    };
    Ok(element)
}

fn to_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

/// Serializable view of a decoded tree, used by `stillcut probe`.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeNode {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProbeNode>,
}

impl From<&Element> for ProbeNode {
    fn from(element: &Element) -> Self {
        let id = element.raw_id();
        let (value, size): (Option<serde_json::Value>, Option<usize>) = match element {
            Element::Master { .. } => (None, None),
            Element::UInt { value, .. } => (Some((*value).into()), None),
            Element::Float { value, .. } => (Some((*value).into()), None),
            Element::Str { value, .. } => (Some(value.clone().into()), None),
            Element::Binary { value, .. } => (None, Some(value.len())),
            Element::Unknown { data, .. } => (None, Some(data.len())),
        };
        ProbeNode {
            id: format!("0x{:0width$X}", id, width = id_width(id) as usize * 2),
            name: element.id().map_or("Unknown", ElementId::name).to_string(),
            value,
            size,
            children: element.children().iter().map(ProbeNode::from).collect(),
        }
    }
}
