#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use stillcut::ebml::Element;
use stillcut::schema::ElementId;

/// Minimal VP8 key frame: frame tag, start code, dimensions and a few
/// bytes of stand-in partition data.
pub fn vp8_keyframe(width: u16, height: u16, fill: u8) -> Vec<u8> {
    let mut vp8 = vec![0x50, 0x02, 0x00];
    vp8.extend_from_slice(&[0x9D, 0x01, 0x2A]);
    vp8.extend_from_slice(&width.to_le_bytes());
    vp8.extend_from_slice(&height.to_le_bytes());
    vp8.extend_from_slice(&[fill; 7]);
    vp8
}

/// Wrap a VP8 bitstream in a `RIFF/WEBP` container.
pub fn webp_file(vp8: &[u8]) -> Vec<u8> {
    let mut chunk = b"VP8 ".to_vec();
    chunk.extend_from_slice(&(vp8.len() as u32).to_le_bytes());
    chunk.extend_from_slice(vp8);
    if vp8.len() % 2 == 1 {
        chunk.push(0);
    }

    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&((chunk.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend(chunk);
    out
}

pub fn webp_frame(width: u16, height: u16) -> Vec<u8> {
    webp_file(&vp8_keyframe(width, height, 0x11))
}

pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:image/webp;base64,{}", STANDARD.encode(bytes))
}

/// Decode a document and return its Segment element.
pub fn segment(bytes: &[u8]) -> Element {
    let tree = stillcut::ebml::decode(bytes).expect("document should decode");
    assert_eq!(tree.len(), 2, "expected EBML header and Segment");
    match &tree[1] {
        element if element.id() == Some(ElementId::Segment) => element.clone(),
        other => panic!("expected Segment, got {:?}", other),
    }
}

pub fn uint_value(element: &Element, id: ElementId) -> u64 {
    match element.child(id) {
        Some(Element::UInt { value, .. }) => *value,
        other => panic!("expected uint {:?}, got {:?}", id, other),
    }
}

pub fn duration(segment: &Element) -> f64 {
    let info = segment.child(ElementId::Info).expect("Info");
    match info.child(ElementId::Duration) {
        Some(Element::Float { value, .. }) => *value,
        other => panic!("expected Duration, got {:?}", other),
    }
}

/// Payloads of every SimpleBlock in the cluster, in order.
pub fn simple_blocks(segment: &Element) -> Vec<Vec<u8>> {
    let cluster = segment.child(ElementId::Cluster).expect("Cluster");
    cluster
        .children()
        .iter()
        .filter_map(|c| match c {
            Element::Binary {
                id: ElementId::SimpleBlock,
                value,
            } => Some(value.clone()),
            _ => None,
        })
        .collect()
}

pub fn block_timecode(block: &[u8]) -> i16 {
    i16::from_be_bytes([block[1], block[2]])
}
