//! Unit tests for ConvertJob
//!
//! These tests validate per-frame conversion through the job layer.

use sws::config::ScaleConfig;
use sws::geometry::{AspectMode, ScaleTarget, Size};
use sws::processing::ConvertJob;
use sws_core::pixfmt::PALETTE_BYTES;
use sws_core::{Colorspace, PixelFormat};

use crate::common::assertions::{assert_all_equal, assert_bytes_within};
use crate::common::test_frames::{create_pattern_frame, create_yuv_frame};

fn exact(src: PixelFormat, src_size: (u32, u32), dst: PixelFormat, dst_size: (u32, u32)) -> ScaleConfig {
    let mut config = ScaleConfig::new(
        src,
        Size::new(src_size.0, src_size.1),
        dst,
        ScaleTarget::Exact(Size::new(dst_size.0, dst_size.1)),
    );
    config.aspect = AspectMode::Distort;
    config
}

#[test]
fn test_output_plane_sizes_for_odd_dimensions() {
    let mut job = ConvertJob::new(exact(PixelFormat::RGB24, (64, 32), PixelFormat::YUV420P, (33, 17))).unwrap();
    let input = create_pattern_frame(PixelFormat::RGB24, 64, 32).into_bytes();
    let out = job.convert_frame(&input).unwrap();

    assert_eq!(out.plane_data(0).len(), 33 * 17);
    assert_eq!(out.plane_data(1).len(), 17 * 9);
    assert_eq!(out.plane_data(2).len(), 17 * 9);
    assert_eq!(job.output_frame_size(), 33 * 17 + 2 * 17 * 9);
}

#[test]
fn test_same_geometry_is_pass_through() {
    for format in [PixelFormat::NV12, PixelFormat::YUV422P, PixelFormat::RGBA] {
        let mut job = ConvertJob::new(exact(format, (16, 8), format, (16, 8))).unwrap();
        let input = create_pattern_frame(format, 16, 8).into_bytes();
        let out = job.convert_frame(&input).unwrap();
        assert_bytes_within(&input, &out.into_bytes(), 1);
    }
}

#[test]
fn test_palette_source_expands_to_rgba() {
    let mut job = ConvertJob::new(exact(PixelFormat::PAL8, (4, 2), PixelFormat::RGBA, (4, 2))).unwrap();
    assert_eq!(job.input_frame_size(), 4 * 2 + PALETTE_BYTES);

    let mut input = vec![1u8; 4 * 2];
    let mut palette = vec![0u8; PALETTE_BYTES];
    palette[4..8].copy_from_slice(&[10, 20, 30, 255]);
    input.extend_from_slice(&palette);

    let out = job.convert_frame(&input).unwrap();
    for px in out.plane_data(0).chunks_exact(4) {
        assert_bytes_within(px, &[30, 20, 10, 255], 1);
    }
}

#[test]
fn test_colorspace_change_between_frames() {
    let mut job = ConvertJob::new(exact(PixelFormat::YUV420P, (8, 8), PixelFormat::RGB24, (8, 8))).unwrap();
    let input = create_yuv_frame(PixelFormat::YUV420P, 8, 8, [128, 200, 60]).into_bytes();

    let bt601 = job.convert_frame(&input).unwrap().into_bytes();
    let details = job.context().colorspace_details();
    let previous = job
        .context()
        .set_colorspace_details(details.with_colorspaces(Colorspace::Bt709, Colorspace::Bt709));
    assert_eq!(previous, details);

    let bt709 = job.convert_frame(&input).unwrap().into_bytes();
    assert_ne!(bt601, bt709);
    // Constant input stays constant under either matrix.
    assert_all_equal(&bt709.iter().step_by(3).copied().collect::<Vec<_>>(), bt709[0]);
}

#[test]
fn test_sixteen_bit_endianness_swap() {
    let mut job = ConvertJob::new(exact(PixelFormat::GRAY16LE, (4, 2), PixelFormat::GRAY16BE, (4, 2))).unwrap();
    let values: Vec<u16> = (0..8).map(|i| 0x1234 + i * 0x0701).collect();
    let input: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

    let out = job.convert_frame(&input).unwrap().into_bytes();
    for (chunk, expected) in out.chunks_exact(2).zip(&values) {
        let got = u16::from_be_bytes([chunk[0], chunk[1]]);
        assert!((got as i32 - *expected as i32).abs() <= 1, "{:#x} vs {:#x}", got, expected);
    }
}

#[test]
fn test_longest_side_keeps_aspect() {
    let config = ScaleConfig::new(
        PixelFormat::RGB24,
        Size::new(100, 50),
        PixelFormat::RGB24,
        ScaleTarget::MaxLongSide(40),
    );
    let job = ConvertJob::new(config).unwrap();
    assert_eq!(job.context().dst_size(), (40, 20));
}

#[test]
fn test_output_only_formats_rejected() {
    let err = ConvertJob::new(exact(PixelFormat::RGB24, (8, 8), PixelFormat::PAL8, (8, 8)))
        .err()
        .expect("pal8 is not an output format");
    assert_eq!(err.category(), "validation");
}

#[test]
fn test_short_input_is_reported() {
    let mut job = ConvertJob::new(exact(PixelFormat::GRAY8, (8, 8), PixelFormat::GRAY8, (4, 4))).unwrap();
    let err = job.convert_frame(&[0u8; 10]).unwrap_err();
    assert_eq!(err.category(), "scale");
}
