//! WebM document assembly.
//!
//! Every frame becomes one key-frame SimpleBlock on a single V_VP8 track
//! inside a single Cluster. Frames are independent still images, so the
//! track never carries inter-frame prediction even though players treat it
//! as a continuous VP8 stream.

use crate::constants::{APP_NAME, TIMECODE_SCALE_NS, WEBM_MIME_TYPE};
use crate::ebml::{self, Element};
use crate::error::{Error, Result};
use crate::schema::ElementId;
use crate::webp;
use log::{debug, info};

/// Track number of the only track, also written into each SimpleBlock.
pub const TRACK_NUMBER: u64 = 1;

/// Track number 1 as a one-byte vint.
const BLOCK_TRACK_VINT: u8 = 0x81;

/// SimpleBlock flags: key frame, no lacing.
const BLOCK_FLAGS_KEYFRAME: u8 = 0x80;

/// One encoded still image and how long it stays on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// A complete WebP file
    pub payload: Vec<u8>,
    pub duration_ms: f64,
}

impl Frame {
    pub fn new(payload: Vec<u8>, duration_ms: f64) -> Self {
        Self {
            payload,
            duration_ms,
        }
    }
}

/// A frame after its WebP container has been inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub width: u32,
    pub height: u32,
    pub bitstream: Vec<u8>,
    pub duration_ms: f64,
}

/// A finished WebM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl Document {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for Document {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Inspect each frame's WebP container, failing on the first bad frame.
pub fn decode_frames(frames: &[Frame]) -> Result<Vec<DecodedFrame>> {
    frames
        .iter()
        .enumerate()
        .map(|(index, frame)| {
            let (width, height, bitstream) =
                webp::inspect(&frame.payload).map_err(|source| Error::Frame { index, source })?;
            debug!(
                "Frame {}: {}x{}, {} byte bitstream, {} ms",
                index,
                width,
                height,
                bitstream.len(),
                frame.duration_ms
            );
            Ok(DecodedFrame {
                width,
                height,
                bitstream,
                duration_ms: frame.duration_ms,
            })
        })
        .collect()
}

/// Check dimensions against frame 0 and durations for sign, returning the
/// total duration in milliseconds.
pub fn validate(frames: &[DecodedFrame]) -> Result<f64> {
    let first = frames.first().ok_or(Error::EmptyFrameSequence)?;
    let mut total_ms: f64 = 0.0;

    for (index, frame) in frames.iter().enumerate() {
        if frame.width != first.width || frame.height != first.height {
            return Err(Error::FrameDimensionMismatch {
                index,
                expected_width: first.width,
                expected_height: first.height,
                actual_width: frame.width,
                actual_height: frame.height,
            });
        }
        if !frame.duration_ms.is_finite() || frame.duration_ms < 0.0 {
            return Err(Error::InvalidFrameDuration {
                index,
                duration_ms: frame.duration_ms,
            });
        }
        total_ms += frame.duration_ms;
    }

    Ok(total_ms)
}

/// Start of each frame in whole milliseconds from the cluster start.
pub fn block_timecodes(frames: &[DecodedFrame]) -> Result<Vec<i16>> {
    let mut elapsed_ms: f64 = 0.0;
    let mut timecodes = Vec::with_capacity(frames.len());

    for (index, frame) in frames.iter().enumerate() {
        let timecode_ms = elapsed_ms.round() as i64;
        let timecode = i16::try_from(timecode_ms)
            .map_err(|_| Error::TimecodeOverflow { index, timecode_ms })?;
        timecodes.push(timecode);
        elapsed_ms += frame.duration_ms;
    }

    Ok(timecodes)
}

/// Build a WebM document from encoded frames.
pub fn build(frames: &[Frame]) -> Result<Document> {
    if frames.is_empty() {
        return Err(Error::EmptyFrameSequence);
    }

    let decoded = decode_frames(frames)?;
    let total_ms = validate(&decoded)?;
    let timecodes = block_timecodes(&decoded)?;
    let (width, height) = (decoded[0].width, decoded[0].height);

    let blocks = decoded
        .iter()
        .zip(timecodes)
        .map(|(frame, timecode)| simple_block(timecode, &frame.bitstream));

    let tree = [
        ebml_header(),
        Element::master(
            ElementId::Segment,
            vec![
                segment_info(total_ms),
                tracks(width, height),
                cluster(blocks.collect()),
            ],
        ),
    ];
    let bytes = ebml::encode(&tree)?;

    info!(
        "Compiled {} frames ({}x{}, {:.1} ms) into {} bytes",
        frames.len(),
        width,
        height,
        total_ms,
        bytes.len()
    );

    Ok(Document {
        bytes,
        mime_type: WEBM_MIME_TYPE,
    })
}

fn ebml_header() -> Element {
    Element::master(
        ElementId::Ebml,
        vec![
            Element::uint(ElementId::EbmlVersion, 1),
            Element::uint(ElementId::EbmlReadVersion, 1),
            Element::uint(ElementId::EbmlMaxIdLength, 4),
            Element::uint(ElementId::EbmlMaxSizeLength, 8),
            Element::string(ElementId::DocType, "webm"),
            Element::uint(ElementId::DocTypeVersion, 2),
            Element::uint(ElementId::DocTypeReadVersion, 2),
        ],
    )
}

fn segment_info(duration_ms: f64) -> Element {
    Element::master(
        ElementId::Info,
        vec![
            Element::uint(ElementId::TimecodeScale, TIMECODE_SCALE_NS),
            Element::string(ElementId::MuxingApp, APP_NAME),
            Element::string(ElementId::WritingApp, APP_NAME),
            Element::float(ElementId::Duration, duration_ms),
        ],
    )
}

fn tracks(width: u32, height: u32) -> Element {
    let video = Element::master(
        ElementId::Video,
        vec![
            Element::uint(ElementId::PixelWidth, width as u64),
            Element::uint(ElementId::PixelHeight, height as u64),
        ],
    );
    let entry = Element::master(
        ElementId::TrackEntry,
        vec![
            Element::uint(ElementId::TrackNumber, TRACK_NUMBER),
            Element::uint(ElementId::TrackUid, 1),
            Element::uint(ElementId::FlagLacing, 0),
            Element::string(ElementId::Language, "und"),
            Element::string(ElementId::CodecId, "V_VP8"),
            Element::string(ElementId::CodecName, "VP8"),
            Element::uint(ElementId::TrackType, 1), // video
            Element::uint(ElementId::FlagEnabled, 1),
            video,
        ],
    );
    Element::master(ElementId::Tracks, vec![entry])
}

fn cluster(blocks: Vec<Element>) -> Element {
    let mut children = Vec::with_capacity(blocks.len() + 1);
    children.push(Element::uint(ElementId::Timecode, 0));
    children.extend(blocks);
    Element::master(ElementId::Cluster, children)
}

fn simple_block(timecode: i16, bitstream: &[u8]) -> Element {
    let mut data = Vec::with_capacity(4 + bitstream.len());
    data.push(BLOCK_TRACK_VINT);
    data.extend_from_slice(&timecode.to_be_bytes());
    data.push(BLOCK_FLAGS_KEYFRAME);
    data.extend_from_slice(bitstream);
    Element::binary(ElementId::SimpleBlock, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(width: u32, height: u32, duration_ms: f64) -> DecodedFrame {
        DecodedFrame {
            width,
            height,
            bitstream: vec![0xAB],
            duration_ms,
        }
    }

    #[test]
    fn test_validate_sums_durations() {
        let frames = vec![decoded(8, 8, 40.0), decoded(8, 8, 0.0), decoded(8, 8, 12.5)];
        assert_eq!(validate(&frames).unwrap(), 52.5);
    }

    #[test]
    fn test_validate_checks_first_frame_duration() {
        let frames = vec![decoded(8, 8, -1.0)];
        assert!(matches!(
            validate(&frames),
            Err(Error::InvalidFrameDuration { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan_duration() {
        let frames = vec![decoded(8, 8, 10.0), decoded(8, 8, f64::NAN)];
        assert!(matches!(
            validate(&frames),
            Err(Error::InvalidFrameDuration { index: 1, .. })
        ));
    }

    #[test]
    fn test_validate_height_mismatch() {
        let frames = vec![decoded(8, 8, 10.0), decoded(8, 8, 10.0), decoded(8, 9, 10.0)];
        assert!(matches!(
            validate(&frames),
            Err(Error::FrameDimensionMismatch {
                index: 2,
                actual_height: 9,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_empty() {
        assert!(matches!(validate(&[]), Err(Error::EmptyFrameSequence)));
    }

    #[test]
    fn test_block_timecodes_round_cumulative_durations() {
        let frames: Vec<_> = (0..4).map(|_| decoded(1, 1, 1000.0 / 60.0)).collect();
        assert_eq!(block_timecodes(&frames).unwrap(), vec![0, 17, 33, 50]);
    }

    #[test]
    fn test_block_timecodes_overflow() {
        let frames = vec![decoded(1, 1, 32767.0), decoded(1, 1, 1.0), decoded(1, 1, 1.0)];
        match block_timecodes(&frames) {
            Err(Error::TimecodeOverflow { index, timecode_ms }) => {
                assert_eq!(index, 2);
                assert_eq!(timecode_ms, 32768);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_block_layout() {
        let block = simple_block(300, &[0x10, 0x20]);
        assert_eq!(
            block,
            Element::binary(
                ElementId::SimpleBlock,
                vec![0x81, 0x01, 0x2C, 0x80, 0x10, 0x20]
            )
        );
    }

    #[test]
    fn test_build_empty() {
        assert!(matches!(build(&[]), Err(Error::EmptyFrameSequence)));
    }

    #[test]
    fn test_build_reports_bad_frame_index() {
        let good = {
            let mut vp8 = vec![0x30, 0x01, 0x00, 0x9D, 0x01, 0x2A, 2, 0, 2, 0];
            vp8.extend_from_slice(&[0; 4]);
            let mut out = b"RIFF".to_vec();
            out.extend_from_slice(&((vp8.len() + 12) as u32).to_le_bytes());
            out.extend_from_slice(b"WEBPVP8 ");
            out.extend_from_slice(&(vp8.len() as u32).to_le_bytes());
            out.extend(vp8);
            out
        };
        let frames = vec![
            Frame::new(good.clone(), 10.0),
            Frame::new(good, 10.0),
            Frame::new(b"not a webp".to_vec(), 10.0),
        ];
        match build(&frames) {
            Err(Error::Frame { index, .. }) => assert_eq!(index, 2),
            other => panic!("expected frame error, got {:?}", other),
        }
    }
}
