//! Band-wise scaling through the engine context.

use sws_core::{ConversionContext, FilterType, FrameBuffer, PixelFormat, ScaleError};

use crate::common::test_frames::create_pattern_frame;

fn context(src: PixelFormat, src_size: (usize, usize), dst: PixelFormat, dst_size: (usize, usize)) -> ConversionContext {
    ConversionContext::new(
        src,
        dst,
        src_size.0 as u32,
        src_size.1 as u32,
        dst_size.0 as u32,
        dst_size.1 as u32,
        FilterType::Spline,
        None,
    )
    .unwrap()
}

#[test]
fn test_bands_reproduce_whole_frame() {
    let src = create_pattern_frame(PixelFormat::NV12, 40, 30);

    let mut whole = FrameBuffer::new(PixelFormat::YUV444P, 23, 51).unwrap();
    let mut ctx = context(PixelFormat::NV12, (40, 30), PixelFormat::YUV444P, (23, 51));
    assert_eq!(ctx.scale_frame(&src.planes(), &mut whole.planes_mut()).unwrap(), 51);

    for band_rows in [2usize, 8, 10] {
        let mut banded = FrameBuffer::new(PixelFormat::YUV444P, 23, 51).unwrap();
        let mut written = 0;
        let mut start = 0;
        while start < 30 {
            let rows = band_rows.min(30 - start);
            written += ctx
                .scale(&src.band(start, rows), start, rows, &mut banded.planes_mut())
                .unwrap();
            start += rows;
        }
        assert_eq!(written, 51, "band size {}", band_rows);
        assert_eq!(banded.into_bytes(), whole.clone().into_bytes(), "band size {}", band_rows);
    }
}

#[test]
fn test_out_of_bounds_band_writes_nothing() {
    let src = create_pattern_frame(PixelFormat::YUV420P, 16, 16);
    let mut dst = FrameBuffer::new(PixelFormat::RGB24, 8, 8).unwrap();
    let mut ctx = context(PixelFormat::YUV420P, (16, 16), PixelFormat::RGB24, (8, 8));

    let err = ctx
        .scale(&src.band(12, 8), 12, 8, &mut dst.planes_mut())
        .unwrap_err();
    assert_eq!(
        err,
        ScaleError::OutOfBounds {
            start: 12,
            rows: 8,
            height: 16
        }
    );
    assert!(dst.plane_data(0).iter().all(|&b| b == 0));
}

#[test]
fn test_bands_must_arrive_in_order() {
    let src = create_pattern_frame(PixelFormat::YUV420P, 16, 16);
    let mut dst = FrameBuffer::new(PixelFormat::RGB24, 8, 8).unwrap();
    let mut ctx = context(PixelFormat::YUV420P, (16, 16), PixelFormat::RGB24, (8, 8));

    ctx.scale(&src.band(0, 8), 0, 8, &mut dst.planes_mut()).unwrap();
    let err = ctx
        .scale(&src.band(0, 8), 0, 8, &mut dst.planes_mut())
        .unwrap_err();
    assert!(matches!(err, ScaleError::SliceOrder { .. }), "{:?}", err);
}

#[test]
fn test_odd_band_start_rejected_for_subsampled_source() {
    let src = create_pattern_frame(PixelFormat::YUV420P, 16, 16);
    let mut dst = FrameBuffer::new(PixelFormat::RGB24, 8, 8).unwrap();
    let mut ctx = context(PixelFormat::YUV420P, (16, 16), PixelFormat::RGB24, (8, 8));

    let err = ctx
        .scale(&src.band(3, 4), 3, 4, &mut dst.planes_mut())
        .unwrap_err();
    assert!(matches!(err, ScaleError::UnalignedSlice { align: 2, .. }), "{:?}", err);
}
