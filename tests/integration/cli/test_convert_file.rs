//! File-to-file conversion as driven by the `sws convert` command.

use std::fs;

use sws::config::ScaleConfig;
use sws::geometry::{ScaleTarget, Size};
use sws::processing::{convert_file, OutputKind};
use sws_core::PixelFormat;

use crate::common::test_frames::create_yuv_frame;

#[test]
fn test_raw_multi_frame_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.yuv");
    let frame = create_yuv_frame(PixelFormat::YUV420P, 32, 16, [235, 128, 128]).into_bytes();
    fs::write(&input, [frame.clone(), frame.clone(), frame].concat()).unwrap();

    let config = ScaleConfig::new(
        PixelFormat::YUV420P,
        Size::new(32, 16),
        PixelFormat::RGB24,
        ScaleTarget::MaxLongSide(16),
    );
    let output = dir.path().join("clip.rgb");
    let stats = convert_file(config, &input, &output, OutputKind::Raw).unwrap();

    assert_eq!(stats.frames, 3);
    let bytes = fs::read(&output).unwrap();
    assert_eq!(bytes.len(), 3 * 16 * 8 * 3);
    // Limited-range white.
    assert!(bytes.iter().all(|&b| b >= 254), "expected white output");
}

#[test]
fn test_png_single_frame() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("frame.rgba");
    fs::write(&input, [40u8, 80, 120, 255].repeat(12 * 6)).unwrap();

    let config = ScaleConfig::new(
        PixelFormat::RGBA,
        Size::new(12, 6),
        PixelFormat::RGB24,
        ScaleTarget::Exact(Size::new(6, 3)),
    );
    let output = dir.path().join("frame.png");
    convert_file(config, &input, &output, OutputKind::Png).unwrap();

    let decoded = image::open(&output).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (6, 3));
    for px in decoded.pixels() {
        assert_eq!(px.0, [40, 80, 120]);
    }
}

#[test]
fn test_truncated_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.yuv");
    fs::write(&input, vec![0u8; 100]).unwrap();

    let config = ScaleConfig::new(
        PixelFormat::YUV420P,
        Size::new(32, 16),
        PixelFormat::RGB24,
        ScaleTarget::Exact(Size::new(32, 16)),
    );
    let err = convert_file(config, &input, dir.path().join("out.rgb"), OutputKind::Raw).unwrap_err();
    assert_eq!(err.category(), "validation");
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert_file(
        ScaleConfig::default(),
        dir.path().join("absent.yuv"),
        dir.path().join("out.rgb"),
        OutputKind::Raw,
    )
    .unwrap_err();
    assert_eq!(err.category(), "io");
}
