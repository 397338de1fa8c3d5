mod common;

use common::*;
use std::cell::Cell;
use stillcut::riff::{self, FourCC};
use stillcut::{from_image_array, Error, FrameCollector, FrameInput, WebpSurface};

/// Stand-in for a canvas that re-encodes itself on demand.
struct Canvas {
    width: u16,
    height: u16,
    last_quality: Cell<Option<f32>>,
}

impl WebpSurface for Canvas {
    fn encode_webp(&self, quality: f32) -> Result<Vec<u8>, String> {
        self.last_quality.set(Some(quality));
        Ok(webp_frame(self.width, self.height))
    }
}

#[test]
fn test_fixed_rate_collector() {
    let mut collector = FrameCollector::new(Some(60.0)).unwrap();
    for _ in 0..6 {
        collector.add(FrameInput::webp(webp_frame(4, 4)), None).unwrap();
    }
    assert_eq!(collector.len(), 6);

    let document = collector.compile().unwrap();
    assert!(collector.is_compiled());

    let segment = segment(&document.bytes);
    assert!((duration(&segment) - 100.0).abs() < 1e-6);
    let timecodes: Vec<i16> = simple_blocks(&segment)
        .iter()
        .map(|b| block_timecode(b))
        .collect();
    assert_eq!(timecodes, vec![0, 17, 33, 50, 67, 83]);
}

#[test]
fn test_explicit_durations() {
    let mut collector = FrameCollector::new(None).unwrap();
    collector
        .add(FrameInput::webp(webp_frame(10, 10)), Some(250.0))
        .unwrap();
    collector
        .add(FrameInput::webp(webp_frame(10, 10)), Some(0.5))
        .unwrap();
    collector
        .add(FrameInput::webp(webp_frame(10, 10)), Some(1000.0))
        .unwrap();

    let segment = segment(&collector.compile().unwrap().bytes);
    assert_eq!(duration(&segment), 1250.5);
    let timecodes: Vec<i16> = simple_blocks(&segment)
        .iter()
        .map(|b| block_timecode(b))
        .collect();
    assert_eq!(timecodes, vec![0, 250, 251]);
}

#[test]
fn test_data_uri_and_raw_bytes_are_equivalent() {
    let frames: Vec<Vec<u8>> = (0..3).map(|i| webp_file(&vp8_keyframe(8, 6, i))).collect();
    let uris: Vec<String> = frames.iter().map(|f| data_uri(f)).collect();

    let from_bytes = from_image_array(frames.into_iter().map(FrameInput::webp), 24.0).unwrap();
    let from_uris = from_image_array(uris.iter().map(|u| FrameInput::DataUri(u)), 24.0).unwrap();
    assert_eq!(from_bytes, from_uris);
}

#[test]
fn test_surface_is_encoded_at_collector_quality() {
    let canvas = Canvas {
        width: 32,
        height: 24,
        last_quality: Cell::new(None),
    };
    let mut collector = FrameCollector::new(Some(10.0))
        .unwrap()
        .with_quality(0.5)
        .unwrap();
    collector.add(FrameInput::Surface(&canvas), None).unwrap();
    collector.add(FrameInput::Surface(&canvas), None).unwrap();
    assert_eq!(canvas.last_quality.get(), Some(0.5));

    let segment = segment(&collector.compile().unwrap().bytes);
    assert_eq!(simple_blocks(&segment).len(), 2);
}

#[test]
fn test_rejected_frame_keeps_earlier_frames() {
    let mut collector = FrameCollector::new(Some(30.0)).unwrap();
    collector.add(FrameInput::webp(webp_frame(4, 4)), None).unwrap();
    assert!(matches!(
        collector.add(FrameInput::DataUri("data:text/plain;base64,aGk="), None),
        Err(Error::UnsupportedFrameFormat(_))
    ));
    assert!(matches!(
        collector.add(FrameInput::webp(webp_frame(4, 4)), Some(5.0)),
        Err(Error::InvalidDurationConfig(_))
    ));
    assert_eq!(collector.len(), 1);
    assert!(collector.compile().is_ok());
}

#[test]
fn test_compile_twice_fails() {
    let mut collector = FrameCollector::new(Some(30.0)).unwrap();
    collector.add(FrameInput::webp(webp_frame(4, 4)), None).unwrap();
    collector.compile().unwrap();

    assert!(matches!(collector.compile(), Err(Error::AlreadyCompiled)));
    assert!(matches!(
        collector.add(FrameInput::webp(webp_frame(4, 4)), None),
        Err(Error::AlreadyCompiled)
    ));
}

#[test]
fn test_dimension_mismatch_through_collector() {
    let mut collector = FrameCollector::new(Some(30.0)).unwrap();
    collector.add(FrameInput::webp(webp_frame(64, 48)), None).unwrap();
    collector.add(FrameInput::webp(webp_frame(32, 48)), None).unwrap();
    let err = collector.compile().unwrap_err();
    assert!(matches!(err, Error::FrameDimensionMismatch { index: 1, .. }));
    assert!(!collector.is_compiled());
}

#[test]
fn test_wav_export_is_a_separate_riff_file() {
    let left = [0.0f32, 0.25, -0.25, 1.0];
    let right = [0.5f32, -0.5, 0.0, -1.0];
    let blob = stillcut::audio::encode_wav(&left, &right, 48000).unwrap();
    assert_eq!(blob.mime_type, "audio/wav");

    let tree = riff::parse(&blob.bytes).unwrap();
    let wave = &tree[&FourCC::RIFF][0];
    assert_eq!(wave.form_type, Some(FourCC(*b"WAVE")));
    let data = &wave.children_of(FourCC(*b"data"))[0].data;
    // 4 stereo frames of 16-bit samples
    assert_eq!(data.len(), 4 * 2 * 2);
    assert_eq!(i16::from_le_bytes([data[2], data[3]]), 16383);
}
